use crate::error::{FileOperation, TransferError};
use crate::models::{CopiedFile, FilterConfig, SourceSelection, TransferFailure, TransferReport};
use crate::utils::{copy_file_overwrite, is_same_directory, list_files_in_directory, relocate_into_subdirectory};
use crate::{DEFAULT_DESTINATION, DEFAULT_VOLUME_ROOT};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Folder inside each source that receives originals when the move option is on
pub const COPIED_SUBDIRECTORY: &str = "copied";

/// What to do when a single file or source folder fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run and return the error.
    /// Files copied before the failure stay in the destination, and a file whose
    /// relocation failed keeps its copy. The partial report is not returned.
    Abort,
    /// Record the failure in the report and keep going
    #[default]
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::Continue => f.write_str("continue"),
        }
    }
}

/// Where and how eligible files are written
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub destination: PathBuf,
    /// Removable volume that must be present before the destination is created
    pub volume_root: Option<PathBuf>,
    pub on_error: FailurePolicy,
    pub preserve_modified: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(DEFAULT_DESTINATION),
            volume_root: Some(PathBuf::from(DEFAULT_VOLUME_ROOT)),
            on_error: FailurePolicy::default(),
            preserve_modified: true,
        }
    }
}

impl TransferConfig {
    /// Config for an arbitrary destination with no volume check
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            volume_root: None,
            ..Self::default()
        }
    }
}

/// Copy every eligible file from the selected folders into the destination.
///
/// Folders are processed in selection order and files in listing order. Only
/// the immediate files of each folder are considered. With `move_after_copy`
/// each copied original is moved into `<folder>/copied/`.
///
/// An empty selection returns [`TransferError::NoSourcesSelected`] before any
/// filesystem access. Destination problems are always fatal; per-file and
/// per-folder problems follow `config.on_error`.
pub fn transfer_files(
    sources: &SourceSelection,
    filter: &FilterConfig,
    config: &TransferConfig,
) -> Result<TransferReport, TransferError> {
    if sources.is_empty() {
        warn!("Transfer requested with no source folders selected");
        return Err(TransferError::NoSourcesSelected);
    }

    info!(
        "Starting transfer from {} folder(s) into {}",
        sources.len(),
        config.destination.display()
    );
    debug!("Filter: {:?}", filter);

    prepare_destination(config)?;

    let mut report = TransferReport::new(&config.destination);

    for source in sources.iter() {
        transfer_from_folder(source, filter, config, &mut report)?;
    }

    let report = report.finish();

    info!(
        "Transfer completed. Copied: {}, Relocated: {}, Failures: {}",
        report.count(),
        report.relocated_count(),
        report.failures.len()
    );

    Ok(report)
}

fn prepare_destination(config: &TransferConfig) -> Result<(), TransferError> {
    if let Some(volume) = &config.volume_root {
        if !volume.exists() {
            return Err(TransferError::DestinationUnavailable {
                path: config.destination.clone(),
                reason: format!("volume {} is not available", volume.display()),
            });
        }
    }

    fs::create_dir_all(&config.destination).map_err(|e| TransferError::DestinationUnavailable {
        path: config.destination.clone(),
        reason: e.to_string(),
    })
}

fn transfer_from_folder(
    source: &Path,
    filter: &FilterConfig,
    config: &TransferConfig,
    report: &mut TransferReport,
) -> Result<(), TransferError> {
    let files = match open_source(source, config) {
        Ok(files) => files,
        Err(e) => return record_or_abort(e, config.on_error, report),
    };

    info!("Scanning {} ({} entries)", source.display(), files.len());

    for entry in files {
        let file = match entry {
            Ok(file) => file,
            Err(e) => {
                record_or_abort(e, config.on_error, report)?;
                continue;
            }
        };
        let Some(file_name) = file.file_name() else {
            continue;
        };
        let name = file_name.to_string_lossy().into_owned();

        if !filter.is_eligible(&name) {
            debug!("Not eligible: {}", name);
            continue;
        }

        let destination = config.destination.join(file_name);
        if let Err(e) = copy_file_overwrite(&file, &destination, config.preserve_modified) {
            record_or_abort(e, config.on_error, report)?;
            continue;
        }
        debug!("Copied {} -> {}", file.display(), destination.display());

        let relocated_to = if filter.move_after_copy {
            match relocate_into_subdirectory(&file, COPIED_SUBDIRECTORY) {
                Ok(target) => Some(target),
                Err(e) => {
                    // the copy stays in place either way
                    record_or_abort(e, config.on_error, report)?;
                    None
                }
            }
        } else {
            None
        };

        report.copied_files.push(CopiedFile {
            name,
            source: file,
            destination,
            relocated_to,
        });
    }

    Ok(())
}

/// Validate a source right before listing it
fn open_source(
    source: &Path,
    config: &TransferConfig,
) -> Result<Vec<Result<PathBuf, TransferError>>, TransferError> {
    if !source.is_dir() {
        let reason = if source.exists() {
            "not a directory"
        } else {
            "does not exist"
        };
        return Err(TransferError::SourceUnavailable {
            path: source.to_path_buf(),
            reason: reason.to_string(),
        });
    }

    if is_same_directory(source, &config.destination) {
        return Err(TransferError::SourceUnavailable {
            path: source.to_path_buf(),
            reason: "source is the destination folder".to_string(),
        });
    }

    list_files_in_directory(source)
}

fn record_or_abort(
    failure: TransferError,
    policy: FailurePolicy,
    report: &mut TransferReport,
) -> Result<(), TransferError> {
    match policy {
        FailurePolicy::Abort => {
            error!(
                "Aborting transfer after {} copied file(s): {}",
                report.count(),
                failure
            );
            Err(failure)
        }
        FailurePolicy::Continue => {
            warn!("{}", failure);
            report.failures.push(failure_entry(&failure));
            Ok(())
        }
    }
}

fn failure_entry(failure: &TransferError) -> TransferFailure {
    let (path, operation) = match failure {
        TransferError::FileOperationFailed { operation, path, .. } => (path.clone(), *operation),
        TransferError::SourceUnavailable { path, .. }
        | TransferError::DestinationUnavailable { path, .. }
        | TransferError::TasksRootMissing { path } => (path.clone(), FileOperation::List),
        TransferError::NoSourcesSelected => (PathBuf::new(), FileOperation::List),
    };

    TransferFailure {
        path,
        operation,
        error: failure.to_string(),
    }
}
