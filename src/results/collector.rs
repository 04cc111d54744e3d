//! Result collector
//!
//! Counts what the engine reports, keeps rendered failure descriptions for
//! the final report, and builds one debugging session per failure or error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, info};

use super::debug::{post_mortem_factory, Debugger, DebuggerFactory};
use super::traceback;
use crate::models::{
    CaseInfo, FailureInfo, RunOptions, RunSummary, TestRecord, TestStatus, Verbosity,
};
use crate::utils::Timer;

/// A recorded failure or error
#[derive(Clone, Debug)]
pub struct Fault {
    /// Index of the debugging session built for this fault
    pub slot: usize,
    pub test_id: String,
    pub description: String,
    /// Traceback as shown in the error list
    pub rendered: String,
    pub info: FailureInfo,
}

/// A recorded skip
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkipEntry {
    pub test_id: String,
    pub description: String,
    pub reason: String,
}

/// Collects outcomes reported during a run
pub struct ResultCollector {
    tests_run: usize,
    successes: usize,
    failures: Vec<Fault>,
    errors: Vec<Fault>,
    skipped: Vec<SkipEntry>,
    debuggers: Vec<Box<dyn Debugger>>,
    debugger_factory: DebuggerFactory,
    records: Vec<TestRecord>,
    should_stop: bool,
    exit_first: bool,
    pdb_mode: bool,
    verbosity: Verbosity,
    stream: Box<dyn Write>,
    started_at: DateTime<Utc>,
    run_timer: Timer,
    test_timer: Option<Timer>,
}

impl ResultCollector {
    /// Collector writing progress to stderr
    pub fn new(options: &RunOptions) -> Self {
        Self {
            tests_run: 0,
            successes: 0,
            failures: Vec::new(),
            errors: Vec::new(),
            skipped: Vec::new(),
            debuggers: Vec::new(),
            debugger_factory: post_mortem_factory(),
            records: Vec::new(),
            should_stop: false,
            exit_first: options.exit_first,
            pdb_mode: options.pdb_mode,
            verbosity: options.verbosity,
            stream: Box::new(io::stderr()),
            started_at: Utc::now(),
            run_timer: Timer::start("run"),
            test_timer: None,
        }
    }

    pub fn with_stream(mut self, stream: Box<dyn Write>) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_debugger_factory(mut self, factory: DebuggerFactory) -> Self {
        self.debugger_factory = factory;
        self
    }

    /// A case is about to run; counts it once
    pub fn start_test(&mut self, case: &CaseInfo) {
        self.tests_run += 1;
        self.test_timer = Some(Timer::start(case.id.to_string()));
        debug!("Starting {}", case.id);
    }

    /// The case has finished
    pub fn stop_test(&mut self, case: &CaseInfo) {
        if let Some(timer) = self.test_timer.take() {
            debug!("Finished {} in {}ms", case.id, timer.elapsed_ms());
        }
    }

    /// Undo the count of a generative parent; its sub-tests count instead
    pub(crate) fn uncount_test(&mut self) {
        self.tests_run = self.tests_run.saturating_sub(1);
    }

    /// Count one executed sub-test
    pub(crate) fn count_subtest(&mut self) {
        self.tests_run += 1;
    }

    pub fn record_success(&mut self, case: &CaseInfo) {
        self.successes += 1;
        self.push_record(case, TestStatus::Pass, None);
    }

    pub fn record_failure(&mut self, case: &CaseInfo, info: FailureInfo) {
        let fault = self.fault(case, info);
        self.push_record(case, TestStatus::Fail, Some(fault.info.summary_line()));
        self.failures.push(fault);
        self.stop_if_exit_first();
    }

    pub fn record_error(&mut self, case: &CaseInfo, info: FailureInfo) {
        let fault = self.fault(case, info);
        self.push_record(case, TestStatus::Error, Some(fault.info.summary_line()));
        self.errors.push(fault);
        self.stop_if_exit_first();
    }

    pub fn record_skip(&mut self, case: &CaseInfo, reason: impl Into<String>) {
        let reason = reason.into();
        self.push_record(case, TestStatus::Skip, Some(reason.clone()));
        self.skipped.push(SkipEntry {
            test_id: case.id.to_string(),
            description: case.description(),
            reason,
        });
    }

    fn fault(&mut self, case: &CaseInfo, info: FailureInfo) -> Fault {
        let slot = self.debuggers.len();
        self.debuggers.push((self.debugger_factory)(&info));
        Fault {
            slot,
            test_id: case.id.to_string(),
            description: case.description(),
            rendered: traceback::render(&info, self.verbosity == Verbosity::Verbose),
            info,
        }
    }

    fn stop_if_exit_first(&mut self) {
        if self.exit_first && !self.should_stop {
            info!("Stopping after first failure");
            self.should_stop = true;
        }
    }

    fn push_record(&mut self, case: &CaseInfo, status: TestStatus, message: Option<String>) {
        let duration_ms = self
            .test_timer
            .replace(Timer::start(case.id.to_string()))
            .map(|timer| timer.elapsed_ms())
            .unwrap_or(0);
        let mut record = TestRecord::new(case.id.to_string(), case.description(), status)
            .with_duration(duration_ms);
        if let Some(message) = message {
            record = record.with_message(message);
        }

        // progress output is best effort
        let _ = match self.verbosity {
            Verbosity::Quiet => Ok(()),
            Verbosity::Normal => {
                write!(self.stream, "{}", status.dot()).and_then(|_| self.stream.flush())
            }
            Verbosity::Verbose => {
                writeln!(self.stream, "{} ... {}", record.description, status.word())
            }
        };

        self.records.push(record);
    }

    /// Ask the engine to stop starting new work
    pub fn request_stop(&mut self) {
        self.should_stop = true;
    }

    pub fn should_stop(&self) -> bool {
        self.should_stop
    }

    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    pub fn failures(&self) -> &[Fault] {
        &self.failures
    }

    pub fn errors(&self) -> &[Fault] {
        &self.errors
    }

    pub fn skipped(&self) -> &[SkipEntry] {
        &self.skipped
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn pdb_mode(&self) -> bool {
        self.pdb_mode
    }

    pub fn was_successful(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }

    pub fn debugger_count(&self) -> usize {
        self.debuggers.len()
    }

    /// Debugging session by chronological slot
    pub fn debugger_mut(&mut self, slot: usize) -> Option<&mut (dyn Debugger + 'static)> {
        self.debuggers.get_mut(slot).map(|d| d.as_mut())
    }

    /// Totals so far
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            started_at: self.started_at,
            tests_run: self.tests_run,
            successes: self.successes,
            failures: self.failures.len(),
            errors: self.errors.len(),
            skipped: self.skipped.len(),
            duration_ms: self.run_timer.elapsed_ms(),
            stopped_early: self.should_stop,
            records: self.records.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestClass;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn case_info(method: &str) -> CaseInfo {
        TestClass::new("m", "TC").case(method, |_| Ok(())).info
    }

    #[test]
    fn test_counts_and_slots() {
        let mut result = ResultCollector::new(&RunOptions::new()).with_stream(Box::new(io::sink()));
        let a = case_info("test_a");

        result.start_test(&a);
        result.record_success(&a);
        result.record_error(&a, FailureInfo::new("Error", "e"));
        result.record_failure(&a, FailureInfo::new("AssertionError", "f"));
        result.record_skip(&a, "later");
        result.stop_test(&a);

        assert_eq!(result.tests_run(), 1);
        assert_eq!(result.successes(), 1);
        assert_eq!(result.errors()[0].slot, 0);
        assert_eq!(result.failures()[0].slot, 1);
        assert_eq!(result.debugger_count(), 2);
        assert_eq!(result.skipped()[0].reason, "later");
        assert!(!result.was_successful());
        assert!(!result.should_stop());
        assert_eq!(result.records().len(), 4);
    }

    #[test]
    fn test_exit_first_sets_should_stop() {
        let mut result = ResultCollector::new(&RunOptions::new().exit_first(true))
            .with_stream(Box::new(io::sink()));
        let a = case_info("test_a");
        result.record_success(&a);
        assert!(!result.should_stop());
        result.record_failure(&a, FailureInfo::new("AssertionError", "f"));
        assert!(result.should_stop());
        assert!(result.summary().stopped_early);
    }

    #[test]
    fn test_progress_dots() {
        let out = Shared::default();
        let mut result =
            ResultCollector::new(&RunOptions::new()).with_stream(Box::new(out.clone()));
        let a = case_info("test_a");

        result.record_success(&a);
        result.record_failure(&a, FailureInfo::new("AssertionError", "f"));
        result.record_error(&a, FailureInfo::new("Error", "e"));
        result.record_skip(&a, "r");
        assert_eq!(out.text(), ".FES");
    }

    #[test]
    fn test_progress_verbose_and_quiet() {
        let out = Shared::default();
        let options = RunOptions::new().with_verbosity(Verbosity::Verbose);
        let mut result = ResultCollector::new(&options).with_stream(Box::new(out.clone()));
        let mut a = case_info("test_a");

        result.record_success(&a);
        a.set_description(Some("named item".to_string()));
        result.record_skip(&a, "r");
        assert_eq!(out.text(), "test_a (m.TC) ... ok\nnamed item ... SKIPPED\n");
        assert_eq!(result.skipped()[0].description, "named item");

        let quiet = Shared::default();
        let options = RunOptions::new().with_verbosity(Verbosity::Quiet);
        let mut result = ResultCollector::new(&options).with_stream(Box::new(quiet.clone()));
        result.record_success(&a);
        assert!(quiet.text().is_empty());
    }

    #[test]
    fn test_generative_counter_adjustment() {
        let mut result = ResultCollector::new(&RunOptions::new()).with_stream(Box::new(io::sink()));
        let a = case_info("test_gen");
        result.start_test(&a);
        result.uncount_test();
        for _ in 0..3 {
            result.count_subtest();
        }
        assert_eq!(result.tests_run(), 3);
    }
}
