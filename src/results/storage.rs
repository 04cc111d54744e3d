//! Results storage and export
//!
//! Saves finished runs as JSON under a results directory and exports them
//! as JSON or CSV.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::collector::ResultCollector;
use crate::models::{RunOptions, RunSummary, TestRecord};

/// A finished run as written to disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run ID
    pub id: String,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    pub tests_run: usize,
    pub successes: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub stopped_early: bool,

    /// One entry per reported outcome
    pub records: Vec<TestRecord>,

    /// Rendered tracebacks of failures and errors
    pub faults: Vec<StoredFault>,

    /// Options the run used
    pub options: RunOptions,

    pub environment: EnvironmentInfo,
}

/// A failure or error with its rendered traceback
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredFault {
    pub test_id: String,
    pub description: String,
    /// `FAIL` or `ERROR`
    pub flavour: String,
    pub traceback: String,
}

/// Environment information
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub arch: String,
    pub tool_version: String,
    pub working_dir: Option<String>,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            working_dir: std::env::current_dir()
                .ok()
                .map(|p| p.display().to_string()),
        }
    }
}

impl StoredRun {
    /// Capture a finished run
    pub fn new(summary: &RunSummary, result: &ResultCollector, options: &RunOptions) -> Self {
        let faults = result
            .errors()
            .iter()
            .map(|f| (f, "ERROR"))
            .chain(result.failures().iter().map(|f| (f, "FAIL")))
            .map(|(fault, flavour)| StoredFault {
                test_id: fault.test_id.clone(),
                description: fault.description.clone(),
                flavour: flavour.to_string(),
                traceback: fault.rendered.clone(),
            })
            .collect();

        Self {
            id: generate_run_id(),
            started_at: summary.started_at,
            completed_at: Utc::now(),
            tests_run: summary.tests_run,
            successes: summary.successes,
            failures: summary.failures,
            errors: summary.errors,
            skipped: summary.skipped,
            duration_ms: summary.duration_ms,
            stopped_early: summary.stopped_early,
            records: summary.records.clone(),
            faults,
            options: options.clone(),
            environment: EnvironmentInfo::default(),
        }
    }

    pub fn was_successful(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Storage under the platform data directory
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skipaware")
            .join("results");
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("{run_id}.json"))
    }

    /// Save a run
    pub fn save(&self, run: &StoredRun) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Failed to create results directory {}", self.base_dir.display())
        })?;

        let path = self.run_path(&run.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, run).context("Failed to write results")?;

        info!("Saved test results to {}", path.display());
        Ok(path)
    }

    /// Load a run by ID
    pub fn load(&self, run_id: &str) -> Result<StoredRun> {
        let path = self.run_path(run_id);
        let run = self.load_from_path(&path)?;
        debug!("Loaded test results from {}", path.display());
        Ok(run)
    }

    pub fn load_from_path(&self, path: &Path) -> Result<StoredRun> {
        let file = File::open(path).context("Failed to open results file")?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("Failed to parse results")
    }

    /// All stored runs, newest first
    pub fn list_runs(&self) -> Result<Vec<StoredRun>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load_from_path(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => debug!("Failed to load {}: {}", path.display(), e),
                }
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    pub fn latest(&self) -> Result<Option<StoredRun>> {
        Ok(self.list_runs()?.into_iter().next())
    }

    /// Export a run to a file
    pub fn export(&self, run: &StoredRun, path: &Path, format: ExportFormat) -> Result<()> {
        export_run(run, path, format)
    }
}

/// Write a run to `path` in the given format
pub fn export_run(run: &StoredRun, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, run)?;
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;

            writer.write_record(["test_id", "description", "status", "duration_ms", "message"])?;
            for record in &run.records {
                writer.write_record([
                    record.test_id.clone(),
                    record.description.clone(),
                    record.status.to_string(),
                    record.duration_ms.to_string(),
                    record.message.clone().unwrap_or_default(),
                ])?;
            }
            writer.flush()?;
        }
    }

    info!("Exported results to {}", path.display());
    Ok(())
}

/// Export format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}
