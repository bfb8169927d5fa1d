pub mod candidates;
pub mod notification;
pub mod transfer;

pub use candidates::{list_programs, list_users, program_sources};
pub use notification::{Cue, LogNotifier, Notifier, Outcome, TerminalNotifier};
pub use transfer::{transfer_files, FailurePolicy, TransferConfig, COPIED_SUBDIRECTORY};
