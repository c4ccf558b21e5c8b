pub mod config;
pub mod paths;

pub use config::{AniListConfig, AutoSyncConfig, Config, SyncConfig};
pub use paths::PathManager;
