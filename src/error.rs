use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Filesystem step that failed for an individual file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    List,
    Copy,
    Relocate,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileOperation::List => "list",
            FileOperation::Copy => "copy",
            FileOperation::Relocate => "relocate",
        };
        f.write_str(label)
    }
}

/// Errors surfaced by the transfer engine and candidate listing
#[derive(thiserror::Error, Debug)]
pub enum TransferError {
    /// The caller handed over an empty selection
    #[error("No source folders selected")]
    NoSourcesSelected,

    /// Destination could not be reached or created
    #[error("Destination unavailable: {path}: {reason}")]
    DestinationUnavailable { path: PathBuf, reason: String },

    /// A selected source is missing, not a directory, or is the destination itself
    #[error("Source folder unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Failed to {operation} {path}: {source}")]
    FileOperationFailed {
        operation: FileOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Tasks root not found: {path}")]
    TasksRootMissing { path: PathBuf },
}

impl TransferError {
    pub fn file_operation(operation: FileOperation, path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransferError::FileOperationFailed {
            operation,
            path: path.into(),
            source,
        }
    }

    /// True for failures caused by the caller's input rather than the filesystem
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TransferError::NoSourcesSelected | TransferError::TasksRootMissing { .. }
        )
    }
}
