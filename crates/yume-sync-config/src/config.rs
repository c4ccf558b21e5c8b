use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub anilist: AniListConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub auto_sync: AutoSyncConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AniListConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Tuning for one sync run: worker-pool width, resolver retry budget
/// and candidate caps, per-stage timeouts.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Width of the miss-resolution worker pool, independent of list size.
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Full passes over the candidate list before reporting not-found.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Cap on generated candidate titles per media record.
    #[serde(default = "default_max_title_candidates")]
    pub max_title_candidates: usize,

    /// Top search results to verify per candidate title.
    #[serde(default = "default_max_results_checked")]
    pub max_results_checked: usize,

    /// Budget around one entry's whole candidate-resolution attempt.
    #[serde(default = "default_entry_timeout_secs")]
    pub entry_timeout_secs: u64,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Forward a progress snapshot to the sink every N completions.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AutoSyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_auto_sync_interval_hours")]
    pub interval_hours: u64,
}

fn default_api_url() -> String {
    "https://graphql.anilist.co".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_concurrent_requests() -> usize {
    50
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_title_candidates() -> usize {
    8
}

fn default_max_results_checked() -> usize {
    6
}

fn default_entry_timeout_secs() -> u64 {
    30
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_progress_interval() -> usize {
    50
}

fn default_auto_sync_interval_hours() -> u64 {
    24
}

fn default_true() -> bool {
    true
}

impl Default for AniListConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
            max_retries: default_max_retries(),
            max_title_candidates: default_max_title_candidates(),
            max_results_checked: default_max_results_checked(),
            entry_timeout_secs: default_entry_timeout_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for AutoSyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_hours: default_auto_sync_interval_hours(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
