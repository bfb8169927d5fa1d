use crate::error::FileOperation;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Report of one transfer run
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub destination: PathBuf,
    /// In processing order: folder order first, then directory listing order
    pub copied_files: Vec<CopiedFile>,
    pub failures: Vec<TransferFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TransferReport {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            destination: destination.into(),
            copied_files: Vec::new(),
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn count(&self) -> usize {
        self.copied_files.len()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.copied_files.iter().map(|file| file.name.as_str()).collect()
    }

    pub fn relocated_count(&self) -> usize {
        self.copied_files
            .iter()
            .filter(|file| file.relocated_to.is_some())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopiedFile {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Set when the original was moved into the source's `copied` folder
    pub relocated_to: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferFailure {
    pub path: PathBuf,
    pub operation: FileOperation,
    pub error: String,
}
