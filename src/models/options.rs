//! Run options
//!
//! The switches the engine consults while running, as resolved from the
//! config file, the environment and the command line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default name of the restart ledger, relative to the working directory
pub const DEFAULT_RESTART_FILE: &str = ".skipaware.restart";

/// Output verbosity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            _ => Verbosity::Verbose,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(Verbosity::Quiet),
            "normal" | "1" => Some(Verbosity::Normal),
            "verbose" | "v" | "2" => Some(Verbosity::Verbose),
            _ => None,
        }
    }
}

/// Options for one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunOptions {
    pub verbosity: Verbosity,
    /// Stop on the first failure or error
    pub exit_first: bool,
    /// Offer post-mortem debugging sessions after the run
    pub pdb_mode: bool,
    /// Tag expression selecting the cases to run
    pub tag_match: Option<String>,
    /// Substring selecting cases by dotted id or sub-test name
    pub pattern: Option<String>,
    /// Skip cases recorded in the restart ledger
    pub restart: bool,
    pub restart_file: PathBuf,
    /// Free-form options readable by test code
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            exit_first: false,
            pdb_mode: false,
            tag_match: None,
            pattern: None,
            restart: false,
            restart_file: PathBuf::from(DEFAULT_RESTART_FILE),
            extra: BTreeMap::new(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn exit_first(mut self, exit_first: bool) -> Self {
        self.exit_first = exit_first;
        self
    }

    pub fn pdb_mode(mut self, pdb_mode: bool) -> Self {
        self.pdb_mode = pdb_mode;
        self
    }

    pub fn with_tag_match(mut self, expr: impl Into<String>) -> Self {
        self.tag_match = Some(expr.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_restart_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.restart_file = path.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }
}
