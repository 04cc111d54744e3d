//! Output formatting module
//!
//! Renders run reports as text, JSON or a one-line summary.

mod formatter;

pub use formatter::{write_report_to_file, OutputFormat, ResultFormatter};
