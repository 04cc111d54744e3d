//! Data models for test execution
//!
//! Test cases, the signals their code returns, run options and the records
//! produced while running.

mod options;
mod signal;
mod test_case;
mod test_result;

pub use options::{RunOptions, Verbosity, DEFAULT_RESTART_FILE};
pub use signal::{
    Cancelled, FailureInfo, Frame, Outcome, Signal, SkipKind, StepResult, Traceback, Traced,
};
pub use test_case::{Body, CaseInfo, GeneratorFn, Hook, TestCase, TestClass, TestFn, TestId};
pub use test_result::{RunSummary, TestRecord, TestStatus};
