pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use error::{FileOperation, TransferError};
pub use models::{CopiedFile, FilterConfig, SourceSelection, TransferFailure, TransferReport};
pub use services::{
    list_programs, list_users, program_sources, transfer_files, Cue, FailurePolicy, LogNotifier, Notifier,
    Outcome, TerminalNotifier, TransferConfig, COPIED_SUBDIRECTORY,
};

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Folder holding `<user>/<program>` source folders
pub const DEFAULT_TASKS_ROOT: &str = r"C:\Tasks";
pub const DEFAULT_DESTINATION: &str = r"D:\data_from_puller";
/// Removable drive the destination lives on
pub const DEFAULT_VOLUME_ROOT: &str = r"D:\";

pub const ENV_TASKS_ROOT: &str = "DATAPULLER_TASKS_ROOT";
pub const ENV_DESTINATION: &str = "DATAPULLER_DESTINATION";
pub const ENV_VOLUME_ROOT: &str = "DATAPULLER_VOLUME_ROOT";
pub const ENV_ON_ERROR: &str = "DATAPULLER_ON_ERROR";
pub const ENV_LOG_LEVEL: &str = "DATAPULLER_LOG_LEVEL";

// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tasks_root: PathBuf,
    pub transfer: TransferConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tasks_root: PathBuf::from(DEFAULT_TASKS_ROOT),
            transfer: TransferConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `DATAPULLER_*` keys.
    /// An empty volume root disables the removable-drive check.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_TASKS_ROOT).filter(|v| !v.trim().is_empty()) {
            config.tasks_root = PathBuf::from(root.trim());
        }
        if let Some(destination) = lookup(ENV_DESTINATION).filter(|v| !v.trim().is_empty()) {
            config.transfer.destination = PathBuf::from(destination.trim());
        }
        if let Some(volume) = lookup(ENV_VOLUME_ROOT) {
            let volume = volume.trim();
            config.transfer.volume_root = (!volume.is_empty()).then(|| PathBuf::from(volume));
        }
        if let Some(policy) = lookup(ENV_ON_ERROR) {
            config.transfer.on_error = policy
                .parse()
                .map_err(|e| anyhow!("Invalid {} value: {}", ENV_ON_ERROR, e))?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            config.log_level = level.trim().to_string();
        }

        Ok(config)
    }
}
