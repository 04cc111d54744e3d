//! skipaware - skip-aware test execution engine
//!
//! Runs test cases through setup, body and teardown, classifies each
//! outcome as pass, fail, error or skip, and reports it to a
//! [`results::ResultCollector`].
//!
//! ## Features
//!
//! - Generative tests: one method expands into a lazy family of sub-tests
//! - Tag expressions (`slow and not db`) for selection
//! - Filtered tracebacks and one post-mortem debugging session per failure
//! - Restart ledger so a stop-on-first-failure run can resume
//!
//! ## Usage
//!
//! ```ignore
//! use skipaware::assertions::ensure_eq;
//! use skipaware::executor::Runner;
//! use skipaware::models::{RunOptions, TestClass};
//! use skipaware::results::ResultCollector;
//!
//! let class = TestClass::new("calc", "AddTC");
//! let mut cases = vec![class.case("test_add", |_| ensure_eq(1 + 1, 2))];
//!
//! let options = RunOptions::new();
//! let mut result = ResultCollector::new(&options);
//! let summary = Runner::new(options).run_all(&mut cases, &mut result, None)?;
//! assert!(summary.was_successful());
//! ```

pub mod assertions;
pub mod cli;
pub mod config;
pub mod executor;
pub mod generative;
pub mod models;
pub mod output;
pub mod results;
pub mod suites;
pub mod tags;
pub mod utils;
