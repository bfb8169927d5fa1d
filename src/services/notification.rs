use crate::error::TransferError;
use crate::models::TransferReport;
use std::io::Write;
use tracing::{info, warn};

/// How a transfer attempt ended, as far as user feedback is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Transferred(usize),
    /// Some files were copied but at least one file or folder failed
    PartiallyFailed(usize),
    /// Folders were selected but none held an eligible file. Not an error.
    NothingMatched,
    NoSourcesSelected,
    DestinationUnavailable,
    TasksRootMissing,
    Failed,
}

/// Feedback cue played for an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Success,
    Failure,
    MissingTasks,
}

impl Outcome {
    pub fn from_report(report: &TransferReport) -> Self {
        match (report.count(), report.has_failures()) {
            (0, false) => Outcome::NothingMatched,
            (0, true) => Outcome::Failed,
            (count, false) => Outcome::Transferred(count),
            (count, true) => Outcome::PartiallyFailed(count),
        }
    }

    pub fn from_error(error: &TransferError) -> Self {
        match error {
            TransferError::NoSourcesSelected => Outcome::NoSourcesSelected,
            TransferError::DestinationUnavailable { .. } => Outcome::DestinationUnavailable,
            TransferError::TasksRootMissing { .. } => Outcome::TasksRootMissing,
            TransferError::SourceUnavailable { .. } | TransferError::FileOperationFailed { .. } => Outcome::Failed,
        }
    }

    pub fn from_result(result: &Result<TransferReport, TransferError>) -> Self {
        match result {
            Ok(report) => Self::from_report(report),
            Err(e) => Self::from_error(e),
        }
    }

    pub fn cue(&self) -> Cue {
        match self {
            Outcome::Transferred(_) => Cue::Success,
            Outcome::TasksRootMissing => Cue::MissingTasks,
            Outcome::PartiallyFailed(_)
            | Outcome::NothingMatched
            | Outcome::NoSourcesSelected
            | Outcome::DestinationUnavailable
            | Outcome::Failed => Cue::Failure,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Outcome::Transferred(count) => format!("Copied {} file(s).", count),
            Outcome::PartiallyFailed(count) => {
                format!("Copied {} file(s), but some files could not be transferred.", count)
            }
            Outcome::NothingMatched => "No files matched your criteria.".to_string(),
            Outcome::NoSourcesSelected => "No subfolders selected.".to_string(),
            Outcome::DestinationUnavailable => {
                "Destination drive not detected. Please insert a USB drive.".to_string()
            }
            Outcome::TasksRootMissing => {
                "Tasks folder is missing. Make sure it is in the expected location.".to_string()
            }
            Outcome::Failed => "Transfer failed.".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Transferred(_))
    }

    /// Files reached the destination, whether or not everything did
    pub fn copied_any(&self) -> bool {
        matches!(self, Outcome::Transferred(_) | Outcome::PartiallyFailed(_))
    }
}

/// Receives the outcome once a transfer attempt is over
pub trait Notifier {
    fn notify(&mut self, outcome: &Outcome);
}

/// Reports outcomes through the tracing subscriber
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, outcome: &Outcome) {
        match outcome.cue() {
            Cue::Success => info!("{}", outcome.message()),
            Cue::Failure | Cue::MissingTasks => warn!("{}", outcome.message()),
        }
    }
}

/// Writes the outcome message to a terminal, optionally ringing the bell
pub struct TerminalNotifier<W: Write> {
    out: W,
    bell: bool,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W, bell: bool) -> Self {
        Self { out, bell }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn notify(&mut self, outcome: &Outcome) {
        // feedback is best effort; a closed stream must not fail the run
        let _ = writeln!(self.out, "{}", outcome.message());
        if self.bell {
            let rings = match outcome.cue() {
                Cue::Success => 1,
                Cue::Failure => 2,
                Cue::MissingTasks => 3,
            };
            let _ = write!(self.out, "{}", "\x07".repeat(rings));
        }
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileOperation;
    use crate::models::{CopiedFile, TransferFailure};
    use std::path::PathBuf;

    fn report_with(count: usize) -> TransferReport {
        let mut report = TransferReport::new("/dst");
        for i in 0..count {
            let name = format!("{}.csv", i);
            report.copied_files.push(CopiedFile {
                source: PathBuf::from("/src").join(&name),
                destination: PathBuf::from("/dst").join(&name),
                name,
                relocated_to: None,
            });
        }
        report
    }

    fn with_failure(mut report: TransferReport) -> TransferReport {
        report.failures.push(TransferFailure {
            path: PathBuf::from("/src/missing"),
            operation: FileOperation::List,
            error: "Source folder unavailable: /src/missing".to_string(),
        });
        report
    }

    #[test]
    fn test_outcome_from_report() {
        assert_eq!(Outcome::from_report(&report_with(3)), Outcome::Transferred(3));
        assert_eq!(Outcome::from_report(&report_with(0)), Outcome::NothingMatched);
    }

    #[test]
    fn test_outcome_from_report_with_failures() {
        let failed = Outcome::from_report(&with_failure(report_with(0)));
        assert_eq!(failed, Outcome::Failed);
        assert!(!failed.copied_any());

        let partial = Outcome::from_report(&with_failure(report_with(2)));
        assert_eq!(partial, Outcome::PartiallyFailed(2));
        assert_eq!(partial.cue(), Cue::Failure);
        assert!(!partial.is_success());
        assert!(partial.copied_any());
    }

    #[test]
    fn test_zero_matches_differs_from_no_sources() {
        let nothing = Outcome::from_result(&Ok(report_with(0)));
        let no_sources = Outcome::from_result(&Err(TransferError::NoSourcesSelected));
        assert_ne!(nothing, no_sources);
        assert_eq!(nothing.cue(), Cue::Failure);
        assert_eq!(no_sources.cue(), Cue::Failure);
    }

    #[test]
    fn test_cue_mapping() {
        assert_eq!(Outcome::Transferred(1).cue(), Cue::Success);
        assert_eq!(Outcome::TasksRootMissing.cue(), Cue::MissingTasks);
        assert_eq!(Outcome::DestinationUnavailable.cue(), Cue::Failure);
        let missing = TransferError::TasksRootMissing { path: PathBuf::from("C:/Tasks") };
        assert_eq!(Outcome::from_error(&missing), Outcome::TasksRootMissing);
    }

    #[test]
    fn test_notifiers_usable_as_trait_objects() {
        let mut notifiers: Vec<Box<dyn Notifier>> = vec![
            Box::new(LogNotifier),
            Box::new(TerminalNotifier::new(std::io::sink(), true)),
        ];
        for notifier in notifiers.iter_mut() {
            notifier.notify(&Outcome::Failed);
        }
    }

    #[test]
    fn test_terminal_notifier_writes_message_and_bell() {
        let mut notifier = TerminalNotifier::new(Vec::new(), true);
        notifier.notify(&Outcome::Transferred(2));
        let output = String::from_utf8(notifier.into_inner()).unwrap();
        assert_eq!(output, "Copied 2 file(s).\n\x07");
    }

    #[test]
    fn test_terminal_notifier_quiet_without_bell() {
        let mut notifier = TerminalNotifier::new(Vec::new(), false);
        notifier.notify(&Outcome::NothingMatched);
        let output = String::from_utf8(notifier.into_inner()).unwrap();
        assert_eq!(output, "No files matched your criteria.\n");
    }
}
