//! Test execution engine
//!
//! Runs cases one after another through setup, body and teardown, expanding
//! generative bodies into their sub-tests.

mod context;
mod generative;
mod runner;
mod select;

pub use context::{Cx, RunContext};
pub use runner::{RunError, Runner};
pub use select::{AllOf, PatternSelector, ResumeSelector, Selector, TagSelector};

/// Source files whose frames are engine internals
pub(crate) const ENGINE_SOURCES: [&str; 2] = [runner::SOURCE_FILE, generative::SOURCE_FILE];
