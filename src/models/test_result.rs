//! Test record models
//!
//! One record per reported outcome, and the run summary handed to output
//! formatters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Skip,
    Error,
}

impl TestStatus {
    /// Progress character in dots mode
    pub fn dot(&self) -> char {
        match self {
            TestStatus::Pass => '.',
            TestStatus::Fail => 'F',
            TestStatus::Skip => 'S',
            TestStatus::Error => 'E',
        }
    }

    /// Progress word in verbose mode
    pub fn word(&self) -> &'static str {
        match self {
            TestStatus::Pass => "ok",
            TestStatus::Fail => "FAIL",
            TestStatus::Skip => "SKIPPED",
            TestStatus::Error => "ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pass => write!(f, "PASS"),
            TestStatus::Fail => write!(f, "FAIL"),
            TestStatus::Skip => write!(f, "SKIP"),
            TestStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// A single reported outcome
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestRecord {
    /// Dotted identity of the case
    pub test_id: String,
    pub description: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl TestRecord {
    pub fn new(
        test_id: impl Into<String>,
        description: impl Into<String>,
        status: TestStatus,
    ) -> Self {
        Self {
            test_id: test_id.into(),
            description: description.into(),
            status,
            duration_ms: 0,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status, self.description, self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Totals of a finished run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub tests_run: usize,
    pub successes: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    /// Whether the run ended early because of stop-on-first-failure
    pub stopped_early: bool,
    pub records: Vec<TestRecord>,
}

impl RunSummary {
    pub fn was_successful(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }

    pub fn pass_rate(&self) -> f64 {
        if self.tests_run == 0 {
            0.0
        } else {
            (self.successes as f64 / self.tests_run as f64) * 100.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run: {} | Pass: {} | Fail: {} | Error: {} | Skip: {} | {}ms",
            self.tests_run,
            self.successes,
            self.failures,
            self.errors,
            self.skipped,
            self.duration_ms
        )
    }
}
