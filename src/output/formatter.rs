//! Output formatters for run reports
//!
//! Text reports list errors, failures and skips followed by the totals;
//! JSON and one-line summary formats are also available.

use serde::Serialize;
use std::io::Write;

use crate::models::RunSummary;
use crate::results::{Fault, ResultCollector, SkipEntry};

const SEPARATOR1: &str =
    "======================================================================";
const SEPARATOR2: &str =
    "----------------------------------------------------------------------";

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct FaultJson<'a> {
    flavour: &'a str,
    test_id: &'a str,
    description: &'a str,
    kind: &'a str,
    message: &'a str,
    traceback: &'a str,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    summary: &'a RunSummary,
    faults: Vec<FaultJson<'a>>,
    skipped: Vec<&'a SkipEntry>,
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Full report of a finished run
    pub fn format_report(&self, result: &ResultCollector, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(result, summary),
            OutputFormat::Json => {
                serde_json::to_string(&Self::report_json(result, summary)).unwrap_or_default()
            }
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(&Self::report_json(result, summary))
                    .unwrap_or_default()
            }
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn report_json<'a>(result: &'a ResultCollector, summary: &'a RunSummary) -> ReportJson<'a> {
        let faults = result
            .errors()
            .iter()
            .map(|f| ("ERROR", f))
            .chain(result.failures().iter().map(|f| ("FAIL", f)))
            .map(|(flavour, fault)| FaultJson {
                flavour,
                test_id: &fault.test_id,
                description: &fault.description,
                kind: &fault.info.kind,
                message: &fault.info.message,
                traceback: &fault.rendered,
            })
            .collect();

        ReportJson {
            summary,
            faults,
            skipped: result.skipped().iter().collect(),
        }
    }

    /// Error, failure and skip lists
    pub fn format_errors(&self, result: &ResultCollector) -> String {
        let mut output = String::new();
        self.push_fault_list(&mut output, "ERROR", result.errors());
        self.push_fault_list(&mut output, "FAIL", result.failures());
        for skip in result.skipped() {
            output.push_str(SEPARATOR1);
            output.push('\n');
            output.push_str(&format!("SKIPPED: {}\n", skip.description));
            output.push_str(&format!("\t{}\n", skip.reason));
        }
        output
    }

    fn push_fault_list(&self, output: &mut String, flavour: &str, faults: &[Fault]) {
        for fault in faults {
            output.push_str(SEPARATOR1);
            output.push('\n');
            output.push_str(&format!("{}: {}\n", flavour, fault.description));
            output.push_str(SEPARATOR2);
            output.push('\n');
            output.push_str(&fault.rendered);
            output.push_str("\n\n");
        }
    }

    fn format_text(&self, result: &ResultCollector, summary: &RunSummary) -> String {
        let mut output = String::from("\n");
        output.push_str(&self.format_errors(result));
        output.push_str(SEPARATOR2);
        output.push('\n');

        let seconds = summary.duration_ms as f64 / 1000.0;
        let plural = if summary.tests_run == 1 { "" } else { "s" };
        output.push_str(&format!(
            "Ran {} test{} in {:.3}s\n\n",
            summary.tests_run, plural, seconds
        ));
        output.push_str(&self.status_line(summary));
        output.push('\n');
        output
    }

    /// `OK` or `FAILED (...)` closing line
    pub fn status_line(&self, summary: &RunSummary) -> String {
        let mut details = Vec::new();
        if summary.failures > 0 {
            details.push(format!("failures={}", summary.failures));
        }
        if summary.errors > 0 {
            details.push(format!("errors={}", summary.errors));
        }
        if summary.skipped > 0 {
            details.push(format!("skipped={}", summary.skipped));
        }

        let (word, color) = if summary.was_successful() {
            ("OK", "\x1b[32m")
        } else {
            ("FAILED", "\x1b[31m")
        };
        let word = if self.colorize {
            format!("{color}{word}\x1b[0m")
        } else {
            word.to_string()
        };

        if details.is_empty() {
            word
        } else {
            format!("{} ({})", word, details.join(", "))
        }
    }

    fn format_summary_brief(&self, summary: &RunSummary) -> String {
        format!(
            "{}/{} passed ({:.1}%), {} failure(s), {} error(s), {} skipped in {}ms",
            summary.successes,
            summary.tests_run,
            summary.pass_rate(),
            summary.failures,
            summary.errors,
            summary.skipped,
            summary.duration_ms
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

/// Write a report to a file
pub fn write_report_to_file(
    path: &str,
    result: &ResultCollector,
    summary: &RunSummary,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_report(result, summary);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
