use anyhow::Result;
use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use yume_sync_models::IdMapping;

use crate::id_cache::IdCache;

/// Local flat-file storage for the identifier cache.
///
/// Binary format (bincode) with gzip compression; survives process
/// restarts so repeat syncs stay cheap even when the durable store is
/// unreachable.
pub struct IdCacheStorage {
    cache_path: PathBuf,
    use_compression: bool,
}

impl IdCacheStorage {
    pub fn new(cache_id_dir: &Path) -> Self {
        Self {
            cache_path: cache_id_dir.join("id_mappings.bin"),
            use_compression: true,
        }
    }

    /// Load cache from disk
    pub fn load(&self) -> Result<IdCache> {
        if !self.cache_path.exists() {
            debug!("ID cache file does not exist, creating new cache");
            return Ok(IdCache::new());
        }

        let start = std::time::Instant::now();
        let data = std::fs::read(&self.cache_path)?;

        let decoded = if self.use_compression {
            let mut decoder = GzDecoder::new(&data[..]);
            let mut decompressed = Vec::new();
            match decoder.read_to_end(&mut decompressed) {
                Ok(_) => decompressed,
                Err(e) => return self.recover_incompatible(&e.to_string()),
            }
        } else {
            data
        };

        // If deserialization fails (e.g., format changed), back up the
        // old file and start with an empty cache.
        let entries: Vec<IdMapping> = match deserialize(&decoded) {
            Ok(entries) => entries,
            Err(e) => return self.recover_incompatible(&e.to_string()),
        };

        let mut cache = IdCache::new();
        for mapping in entries {
            cache.insert(mapping);
        }
        cache.mark_clean();

        info!(
            "Loaded ID cache: {} entries in {:?}",
            cache.len(),
            start.elapsed()
        );

        Ok(cache)
    }

    /// Back up an unreadable cache file and continue with an empty cache.
    fn recover_incompatible(&self, reason: &str) -> Result<IdCache> {
        let backup_path = self.cache_path.with_extension("bin.bak");
        if let Err(backup_err) = std::fs::copy(&self.cache_path, &backup_path) {
            warn!(
                "Failed to backup incompatible cache file: {}. Starting with empty cache.",
                backup_err
            );
        } else {
            info!(
                "Cache format incompatible (error: {}). Backed up old cache to {:?} and starting with empty cache.",
                reason, backup_path
            );
        }
        Ok(IdCache::new())
    }

    /// Save cache to disk
    pub fn save(&self, cache: &IdCache) -> Result<()> {
        let start = std::time::Instant::now();

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = cache.all_entries();
        let serialized = serialize(&entries)?;

        let encoded = if self.use_compression {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&serialized)?;
            encoder.finish()?
        } else {
            serialized
        };

        // Atomic write: write to temp file, then rename
        let temp_path = self.cache_path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)?;
        std::fs::rename(&temp_path, &self.cache_path)?;

        info!(
            "Saved ID cache: {} entries in {:?}",
            cache.len(),
            start.elapsed()
        );

        Ok(())
    }

    /// Get cache file size
    pub fn size(&self) -> Result<u64> {
        if self.cache_path.exists() {
            Ok(std::fs::metadata(&self.cache_path)?.len())
        } else {
            Ok(0)
        }
    }

    pub fn cache_exists(&self) -> bool {
        self.cache_path.exists()
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Delete the cache file (admin operation).
    pub fn clear(&self) -> Result<()> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path)?;
        }
        Ok(())
    }
}
