pub mod filter_config;
pub mod source_selection;
pub mod transfer_report;

pub use filter_config::FilterConfig;
pub use source_selection::SourceSelection;
pub use transfer_report::{CopiedFile, TransferFailure, TransferReport};
