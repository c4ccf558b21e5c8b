use anyhow::Result;
use std::path::{Path, PathBuf};

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("YUMESYNC_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("yumesync");

        Ok(Self {
            config_dir: base_dir.clone(),
            data_dir: base_dir.join("data"),
        })
    }

    pub fn from_docker_env() -> Self {
        let base = container_base_path();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_id_dir(&self) -> PathBuf {
        self.data_dir.join("cache").join("id")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // In containers the HOME-based config dir may not exist
        if std::env::var("YUMESYNC_BASE_PATH").is_ok() {
            Self::from_docker_env()
        } else {
            Self::new().unwrap_or_else(|_| Self::from_docker_env())
        }
    }
}
