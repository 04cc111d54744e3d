//! Configuration module
//!
//! Run settings come from a config file, then a named profile, then
//! `SKIPAWARE_*` environment variables, then command line flags.

mod env;
mod file;
mod profile;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};
pub use file::ConfigFile;
pub use profile::RunProfile;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::{RunOptions, Verbosity, DEFAULT_RESTART_FILE};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub verbosity: Verbosity,

    /// Stop on the first failure or error
    pub exit_first: bool,

    /// Offer post-mortem debugging after the run
    pub pdb: bool,

    /// Restart ledger location
    pub restart_file: PathBuf,

    /// Log level for engine diagnostics
    pub log_level: String,

    /// Report format: text, json, json-pretty or summary
    pub format: String,

    /// Where stored runs go; platform data directory when unset
    pub results_dir: Option<PathBuf>,

    /// Free-form options readable by test code
    pub options: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            exit_first: false,
            pdb: false,
            restart_file: PathBuf::from(DEFAULT_RESTART_FILE),
            log_level: "warn".to_string(),
            format: "text".to_string(),
            results_dir: None,
            options: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if file::is_yaml_file(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if file::is_yaml_file(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Run options as configured, before profile, environment and flags
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new()
            .with_verbosity(self.verbosity)
            .exit_first(self.exit_first)
            .pdb_mode(self.pdb)
            .with_restart_file(self.restart_file.clone());
        for (key, value) in &self.options {
            options = options.with_extra(key.clone(), value.clone());
        }
        options
    }
}
