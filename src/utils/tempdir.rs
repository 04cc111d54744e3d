//! Scratch directories and file trees for test code

use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;
use tracing::{debug, warn};

const PREFIX: &str = "skipaware-";

/// The working directory is process-wide; changes to it are serialized
static CWD_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn cwd_lock() -> MutexGuard<'static, ()> {
    CWD_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Temporary directory removed when dropped
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(PREFIX).tempdir()?;
        debug!("Created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(path)
    }

    /// Make this the working directory until the returned guard drops
    pub fn enter(&self) -> io::Result<WorkingDir> {
        WorkingDir::enter(self.path())
    }

    pub fn create_files(&self, paths: &[&str]) -> io::Result<()> {
        create_files(paths, self.path())
    }

    /// Remove the directory now, reporting failures
    pub fn close(self) -> io::Result<()> {
        debug!("Removing scratch directory {}", self.dir.path().display());
        self.dir.close()
    }
}

/// Working directory switch, undone on drop
///
/// Holds a process-wide lock while alive, so entering a second directory
/// from the same thread blocks.
#[derive(Debug)]
pub struct WorkingDir {
    previous: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl WorkingDir {
    pub fn enter(path: &Path) -> io::Result<Self> {
        let lock = cwd_lock();
        let previous = env::current_dir()?;
        env::set_current_dir(path)?;
        debug!("Working directory is now {}", path.display());
        Ok(Self {
            previous,
            _lock: lock,
        })
    }

    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(
                "Could not return to {}: {}",
                self.previous.display(),
                err
            );
        }
    }
}

/// Create the directories and empty files named by `paths` under `root`
///
/// A path ending in `/` is a directory. Existing files are left untouched.
pub fn create_files(paths: &[&str], root: impl AsRef<Path>) -> io::Result<()> {
    let root = root.as_ref();
    for path in paths {
        let target = root.join(path);
        if path.ends_with('/') {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&target)?;
    }
    Ok(())
}
