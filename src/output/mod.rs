//! Report structures and output formatting

pub mod formatter;
pub mod report;

pub use formatter::{ConsoleFormatter, JsonFormatter, OutputFormatter};
pub use report::{BatchReport, MatchReport, ReportMetadata};
