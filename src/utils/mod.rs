//! Logging, timing and scratch directory helpers

mod logger;
mod tempdir;
mod timer;

pub use logger::{init_logger, LogLevel};
pub(crate) use tempdir::cwd_lock;
pub use tempdir::{create_files, ScratchDir, WorkingDir};
pub use timer::{Stopwatch, Timer};
