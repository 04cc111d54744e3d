//! Restart ledger
//!
//! Append-only file listing the cases that succeeded while
//! stop-on-first-failure was active, one `module.Class.method` per line,
//! so an aborted run can be resumed.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{TestId, DEFAULT_RESTART_FILE};

#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// Failure to persist or read the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to append to restart ledger {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to read restart ledger {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to remove restart ledger {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// Handle on the ledger file; the file itself is only open while appending
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestartLedger {
    path: PathBuf,
}

impl Default for RestartLedger {
    fn default() -> Self {
        Self::new(DEFAULT_RESTART_FILE)
    }
}

impl RestartLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one successful case
    pub fn append(&self, id: &TestId) -> Result<(), LedgerError> {
        let result = self.write_line(&id.to_string());
        if let Err(source) = result {
            let cwd = std::env::current_dir().unwrap_or_default();
            error!(
                "Error while saving succeeded test into {}",
                cwd.join(&self.path).display()
            );
            return Err(LedgerError::Write {
                path: self.path.clone(),
                source,
            });
        }
        debug!("Recorded {} in {}", id, self.path.display());
        Ok(())
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(LINE_SEPARATOR.as_bytes())?;
        file.flush()
    }

    /// Every recorded identity, in file order; empty when the file is missing
    pub fn entries(&self) -> Result<Vec<String>, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LedgerError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Recorded identities as a set, for resuming
    pub fn succeeded(&self) -> Result<HashSet<String>, LedgerError> {
        Ok(self.entries()?.into_iter().collect())
    }

    /// Remove the ledger file; a missing file is not an error
    pub fn clear(&self) -> Result<(), LedgerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LedgerError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> RestartLedger {
        RestartLedger::new(dir.path().join(DEFAULT_RESTART_FILE))
    }

    #[test]
    fn test_append_writes_one_line_per_case() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);

        ledger.append(&TestId::new("mod", "TC", "test_a")).unwrap();
        ledger.append(&TestId::new("mod", "TC", "test_b")).unwrap();

        let raw = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(
            raw,
            format!("mod.TC.test_a{LINE_SEPARATOR}mod.TC.test_b{LINE_SEPARATOR}")
        );
    }

    #[test]
    fn test_append_never_deduplicates() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        let id = TestId::new("mod", "TC", "test_a");

        ledger.append(&id).unwrap();
        ledger.append(&id).unwrap();

        assert_eq!(ledger.entries().unwrap().len(), 2);
        assert_eq!(ledger.succeeded().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        assert!(ledger.entries().unwrap().is_empty());
        ledger.clear().unwrap();
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger.append(&TestId::new("m", "C", "t")).unwrap();
        ledger.clear().unwrap();
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_write_failure_surfaces_io_error() {
        let dir = TempDir::new().unwrap();
        let ledger = RestartLedger::new(dir.path().join("missing").join("ledger"));

        let err = ledger.append(&TestId::new("m", "C", "t")).unwrap_err();
        match err {
            LedgerError::Write { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
