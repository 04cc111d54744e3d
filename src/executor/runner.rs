//! Test execution runner
//!
//! Drives each case through setup, body and teardown, reports outcomes to
//! the collector and records successes in the restart ledger while
//! stop-on-first-failure is active.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::context::{Cx, RunContext};
use super::generative::proceed_generative;
use super::select::Selector;
use crate::models::{
    Body, CaseInfo, Cancelled, FailureInfo, Frame, Outcome, RunOptions, RunSummary, Signal,
    TestCase, TestFn,
};
use crate::results::{LedgerError, ResultCollector};

pub(crate) const SOURCE_FILE: &str = file!();

/// Why a run could not go on
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run cancelled: {0}")]
    Cancelled(Cancelled),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<Cancelled> for RunError {
    fn from(cancel: Cancelled) -> Self {
        RunError::Cancelled(cancel)
    }
}

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

/// Keep panics raised inside [`guarded`] off stderr; the collector reports
/// them. Panics elsewhere still reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            if GUARD_DEPTH.with(Cell::get) == 0 {
                previous(panic_info);
            } else if let Some(location) = panic_info.location() {
                debug!("Test code panicked at {}:{}", location.file(), location.line());
            }
        }));
    });
}

/// Invoke test code, turning panics into signals and recording the engine
/// frame that called it
pub(crate) fn guarded<T, F>(function: &str, line: u32, f: F) -> Result<T, Signal>
where
    F: FnOnce() -> Result<T, Signal>,
{
    install_quiet_hook();
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let caught = panic::catch_unwind(AssertUnwindSafe(f));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    let result = match caught {
        Ok(result) => result,
        Err(payload) => Err(panic_signal(payload)),
    };
    result.map_err(|mut signal| {
        if let Some(info) = signal.info_mut() {
            info.traceback
                .push_outer(Frame::new(SOURCE_FILE, line, function));
        }
        signal
    })
}

fn panic_signal(payload: Box<dyn Any + Send>) -> Signal {
    if let Some(cancel) = payload.downcast_ref::<Cancelled>() {
        return Signal::Cancelled(*cancel);
    }
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "test code panicked".to_string());
    // assert!, assert_eq! and assert_ne! messages
    if message.starts_with("assertion") {
        Signal::Failure(FailureInfo::new("AssertionError", message))
    } else {
        Signal::Error(FailureInfo::new("Panic", message))
    }
}

/// Setup and teardown problems are errors whatever their kind
fn hook_outcome(outcome: Outcome) -> Outcome {
    match outcome {
        Outcome::Failure(info) => Outcome::Error(info),
        other => other,
    }
}

/// Runs test cases against a collector
#[derive(Debug)]
pub struct Runner {
    context: RunContext,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self {
            context: RunContext::new(options),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RunContext {
        &mut self.context
    }

    /// Run one case
    ///
    /// Only cancellation and ledger failures are returned; every other
    /// outcome is reported to `result`.
    pub fn run(
        &mut self,
        case: &mut TestCase,
        result: &mut ResultCollector,
        selector: Option<&dyn Selector>,
    ) -> Result<(), RunError> {
        if let Some(reason) = case.info.skip_reason() {
            let reason = reason.to_string();
            debug!("Skipping {}: {}", case.info.id, reason);
            result.record_skip(&case.info, reason);
            return Ok(());
        }

        if let Some(selector) = selector {
            let admitted = if case.is_generative() {
                selector.admits_generative(&case.info)
            } else {
                selector.accepts_case(&case.info)
            };
            if !admitted {
                debug!("Omitting {}", case.info.id);
                return Ok(());
            }
        }

        result.start_test(&case.info);
        let outcome = self.run_case(case, result, selector);
        case.info.set_description(None);
        result.stop_test(&case.info);
        outcome
    }

    fn run_case(
        &mut self,
        case: &mut TestCase,
        result: &mut ResultCollector,
        selector: Option<&dyn Selector>,
    ) -> Result<(), RunError> {
        let TestCase {
            info,
            setup,
            teardown,
            body,
        } = case;

        if let Some(hook) = setup.as_mut() {
            let step = guarded("setup", line!(), || {
                hook(&mut Cx::new(&mut *info, &mut self.context))
            });
            match hook_outcome(Outcome::classify(step)?) {
                Outcome::Success => {}
                Outcome::Skip { reason, .. } => {
                    result.record_skip(info, reason);
                    return Ok(());
                }
                Outcome::Error(failure) | Outcome::Failure(failure) => {
                    result.record_error(info, failure);
                    return Ok(());
                }
            }
        }

        let generative = body.is_generative();
        let mut success = match body {
            Body::Plain(test) => self.run_plain(info, test, result)?,
            Body::Generative(generator) => {
                proceed_generative(&mut self.context, info, generator, result, selector)?
            }
        };

        if let Some(hook) = teardown.as_mut() {
            let step = guarded("teardown", line!(), || {
                hook(&mut Cx::new(&mut *info, &mut self.context))
            });
            match hook_outcome(Outcome::classify(step)?) {
                Outcome::Success => {}
                Outcome::Skip { reason, .. } => {
                    result.record_skip(info, reason);
                    success = false;
                }
                Outcome::Error(failure) | Outcome::Failure(failure) => {
                    result.record_error(info, failure);
                    success = false;
                }
            }
        }

        if !success {
            return Ok(());
        }
        if !generative {
            result.record_success(info);
        }
        if self.context.options().exit_first {
            self.context.ledger().append(&info.id)?;
        }
        Ok(())
    }

    fn run_plain(
        &mut self,
        info: &mut CaseInfo,
        test: &mut TestFn,
        result: &mut ResultCollector,
    ) -> Result<bool, RunError> {
        let step = guarded("run_test", line!(), || {
            test(&mut Cx::new(&mut *info, &mut self.context))
        });
        match Outcome::classify(step)? {
            Outcome::Success => Ok(true),
            Outcome::Failure(failure) => {
                result.record_failure(info, failure);
                Ok(false)
            }
            Outcome::Error(failure) => {
                result.record_error(info, failure);
                Ok(false)
            }
            Outcome::Skip { reason, .. } => {
                result.record_skip(info, reason);
                Ok(false)
            }
        }
    }

    /// Run cases in order until the collector asks to stop
    pub fn run_suite(
        &mut self,
        cases: &mut [TestCase],
        result: &mut ResultCollector,
        selector: Option<&dyn Selector>,
    ) -> Result<(), RunError> {
        let total = cases.len();
        for (index, case) in cases.iter_mut().enumerate() {
            if result.should_stop() {
                warn!("Stopping early, {} case(s) not started", total - index);
                break;
            }
            self.run(case, result, selector)?;
        }
        Ok(())
    }

    /// Run cases and summarize
    pub fn run_all(
        &mut self,
        cases: &mut [TestCase],
        result: &mut ResultCollector,
        selector: Option<&dyn Selector>,
    ) -> Result<RunSummary, RunError> {
        info!("Running {} test case(s)", cases.len());
        self.run_suite(cases, result, selector)?;

        let summary = result.summary();
        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.duration_ms,
            summary.successes,
            summary.tests_run,
            summary.pass_rate()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{ensure, ensure_eq};
    use crate::executor::select::PatternSelector;
    use crate::generative::{producer, try_producer, Params, Yield};
    use crate::models::{StepResult, TestClass, TestStatus};
    use crate::results::RestartLedger;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;
    use tempfile::TempDir;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Log, entry: &str) {
        log.borrow_mut().push(entry.to_string());
    }

    fn options_in(dir: &TempDir) -> RunOptions {
        RunOptions::new().with_restart_file(dir.path().join(".restart"))
    }

    fn collector(options: &RunOptions) -> ResultCollector {
        ResultCollector::new(options).with_stream(Box::new(io::sink()))
    }

    fn lifecycle_case(
        log: &Log,
        setup: Option<Signal>,
        body: Option<Signal>,
        teardown: Option<Signal>,
    ) -> TestCase {
        let (l1, l2, l3) = (Rc::clone(log), Rc::clone(log), Rc::clone(log));
        TestClass::new("m", "LifeTC")
            .case("test_body", move |_| {
                push(&l2, "body");
                body.clone().map_or(Ok(()), Err)
            })
            .with_setup(move |_| {
                push(&l1, "setup");
                setup.clone().map_or(Ok(()), Err)
            })
            .with_teardown(move |_| {
                push(&l3, "teardown");
                teardown.clone().map_or(Ok(()), Err)
            })
    }

    fn counting_generative(log: &Log, fail_at: Option<i64>) -> TestCase {
        let log = Rc::clone(log);
        TestClass::new("m", "GenTC").generative("test_gen", move |_| {
            let log = Rc::clone(&log);
            Ok(producer((1..=3).map(move |n: i64| {
                let log = Rc::clone(&log);
                Yield::call(move |_, params| {
                    let n: i64 = params.arg(0)?;
                    push(&log, &n.to_string());
                    ensure(Some(n) != fail_at, format!("item {n} failed"))
                })
                .arg(n)
            })))
        })
    }

    #[test]
    fn test_plain_success() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, None, None, None);

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["setup", "body", "teardown"]);
        assert_eq!(result.tests_run(), 1);
        assert_eq!(result.successes(), 1);
        assert!(result.was_successful());
        assert!(!dir.path().join(".restart").exists());
    }

    #[test]
    fn test_teardown_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, None, None, Some(Signal::failure("cleanup")));

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(result.successes(), 0);
        assert_eq!(result.errors().len(), 1);
        assert!(result.failures().is_empty());
        assert_eq!(result.errors()[0].info.message, "cleanup");
    }

    #[test]
    fn test_setup_error_skips_body_and_teardown() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, Some(Signal::error("no fixture")), None, None);

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["setup"]);
        assert_eq!(result.tests_run(), 1);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.successes(), 0);
    }

    #[test]
    fn test_setup_skip_records_skip() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, Some(Signal::skip("no db")), None, None);

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["setup"]);
        assert_eq!(result.skipped()[0].reason, "no db");
        assert!(result.was_successful());
    }

    #[test]
    fn test_body_outcomes() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(false);
        let mut result = collector(&options);
        let mut runner = Runner::new(options);
        let calls = log();

        let mut failing = lifecycle_case(&calls, None, Some(Signal::failure("bad")), None);
        let mut erroring = lifecycle_case(&calls, None, Some(Signal::error("worse")), None);
        let mut skipping = lifecycle_case(&calls, None, Some(Signal::skip("later")), None);
        runner.run(&mut failing, &mut result, None).unwrap();
        runner.run(&mut erroring, &mut result, None).unwrap();
        runner.run(&mut skipping, &mut result, None).unwrap();

        assert_eq!(result.tests_run(), 3);
        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.skipped().len(), 1);
        assert_eq!(result.successes(), 0);
        // teardown still ran after each body
        assert_eq!(calls.borrow().iter().filter(|c| *c == "teardown").count(), 3);
    }

    #[test]
    fn test_body_panic_is_error() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "TC").case("test_index", |_| {
            let empty: Vec<u8> = Vec::new();
            ensure_eq(empty[3], 0)
        });

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert!(result.failures().is_empty());
        assert_eq!(result.errors().len(), 1);
        let info = &result.errors()[0].info;
        assert_eq!(info.kind, "Panic");
        assert!(info.message.starts_with("index out of bounds"));
        assert_eq!(result.records()[0].status, TestStatus::Error);
    }

    #[test]
    fn test_assert_panic_is_failure() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(false);
        let mut result = collector(&options);
        let mut runner = Runner::new(options);
        let class = TestClass::new("m", "TC");
        let mut plain = class.case("test_assert", |cx| {
            assert!(cx.id().method.len() > 100);
            Ok(())
        });
        let mut equal = class.case("test_assert_eq", |_| {
            assert_eq!(1, 2);
            Ok(())
        });

        runner.run(&mut plain, &mut result, None).unwrap();
        runner.run(&mut equal, &mut result, None).unwrap();

        assert!(result.errors().is_empty());
        assert_eq!(result.failures().len(), 2);
        assert_eq!(result.failures()[0].info.kind, "AssertionError");
        assert_eq!(result.records()[0].status, TestStatus::Fail);
    }

    #[test]
    fn test_panic_in_guard_restores_depth() {
        let caught: Result<(), Signal> = guarded("run_test", line!(), || panic!("quiet"));
        assert!(matches!(caught, Err(Signal::Error(_))));
        assert_eq!(GUARD_DEPTH.with(Cell::get), 0);
    }

    #[test]
    fn test_engine_frame_recorded_outermost() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "TC").case("test_eq", |_| ensure_eq(1, 2));

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        let info = &result.failures()[0].info;
        assert_eq!(info.traceback.frames()[0].file, SOURCE_FILE);
        assert_eq!(info.traceback.frames()[1].file, file!());
        assert!(!result.failures()[0].rendered.contains("run_test"));
    }

    #[test]
    fn test_skip_marker_does_not_count() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, None, None, None).skip("not today");

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert!(calls.borrow().is_empty());
        assert_eq!(result.tests_run(), 0);
        assert_eq!(result.skipped()[0].reason, "not today");
    }

    #[test]
    fn test_rejected_case_is_omitted() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, None, None, None);
        let reject_all = |_: &CaseInfo| false;

        Runner::new(options)
            .run(&mut case, &mut result, Some(&reject_all))
            .unwrap();

        assert!(calls.borrow().is_empty());
        assert_eq!(result.tests_run(), 0);
        assert!(result.records().is_empty());
    }

    #[test]
    fn test_rejected_generative_case_is_omitted() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let calls = log();
        let (on_setup, on_teardown) = (Rc::clone(&calls), Rc::clone(&calls));
        let mut case = counting_generative(&calls, Some(1))
            .with_setup(move |_| {
                push(&on_setup, "setup");
                Ok(())
            })
            .with_teardown(move |_| {
                push(&on_teardown, "teardown");
                Ok(())
            });
        let reject_all = |_: &CaseInfo| false;

        Runner::new(options.clone())
            .run(&mut case, &mut result, Some(&reject_all))
            .unwrap();

        assert!(calls.borrow().is_empty());
        assert_eq!(result.tests_run(), 0);
        assert!(result.records().is_empty());
        assert!(RestartLedger::new(options.restart_file)
            .entries()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_teardown_skip_aborts_success() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, None, None, Some(Signal::skip("no cleanup")));

        Runner::new(options.clone()).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["setup", "body", "teardown"]);
        assert_eq!(result.tests_run(), 1);
        assert_eq!(result.successes(), 0);
        assert_eq!(result.skipped()[0].reason, "no cleanup");
        assert!(RestartLedger::new(options.restart_file)
            .entries()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_teardown_error_writes_no_ledger_entry() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(&calls, None, None, Some(Signal::error("cleanup")));

        Runner::new(options.clone()).run(&mut case, &mut result, None).unwrap();

        assert_eq!(result.errors().len(), 1);
        assert!(result.should_stop());
        assert!(RestartLedger::new(options.restart_file)
            .entries()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_cancellation_propagates() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = lifecycle_case(
            &calls,
            None,
            Some(Signal::Cancelled(Cancelled::Interrupt)),
            None,
        );

        let err = Runner::new(options.clone())
            .run(&mut case, &mut result, None)
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled(Cancelled::Interrupt)));
        assert_eq!(*calls.borrow(), vec!["setup", "body"]);

        let mut exiting = TestClass::new("m", "TC")
            .case("test_exit", |_| panic::panic_any(Cancelled::Exit(3)));
        let err = Runner::new(options)
            .run(&mut exiting, &mut result, None)
            .unwrap_err();
        assert!(matches!(err, RunError::Cancelled(Cancelled::Exit(3))));
    }

    #[test]
    fn test_ledger_appended_across_runs() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let class = TestClass::new("pkg.mod", "TC");

        let mut first = class.case("test_a", |_| Ok(()));
        let mut result = collector(&options);
        Runner::new(options.clone()).run(&mut first, &mut result, None).unwrap();

        let mut second = class.case("test_b", |_| Ok(()));
        let mut failing = class.case("test_c", |_| Err(Signal::failure("no")));
        let mut result = collector(&options);
        let mut runner = Runner::new(options.clone());
        runner.run(&mut second, &mut result, None).unwrap();
        runner.run(&mut failing, &mut result, None).unwrap();

        let ledger = RestartLedger::new(options.restart_file);
        assert_eq!(
            ledger.entries().unwrap(),
            vec!["pkg.mod.TC.test_a", "pkg.mod.TC.test_b"]
        );
    }

    #[test]
    fn test_ledger_write_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let options = RunOptions::new()
            .exit_first(true)
            .with_restart_file(dir.path().join("missing").join(".restart"));
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));

        let err = Runner::new(options).run(&mut case, &mut result, None).unwrap_err();
        assert!(matches!(err, RunError::Ledger(_)));
    }

    #[test]
    fn test_generative_counts_items() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = counting_generative(&calls, None);

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["1", "2", "3"]);
        assert_eq!(result.tests_run(), 3);
        assert_eq!(result.successes(), 3);
    }

    #[test]
    fn test_generative_failure_continues() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let calls = log();
        let mut case = counting_generative(&calls, Some(2));

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["1", "2", "3"]);
        assert_eq!(result.tests_run(), 3);
        assert_eq!(result.successes(), 2);
        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.failures()[0].info.message, "item 2 failed");
    }

    #[test]
    fn test_generative_exit_first_stops_pulling() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let calls = log();
        let mut case = counting_generative(&calls, Some(2));

        Runner::new(options.clone()).run(&mut case, &mut result, None).unwrap();

        assert_eq!(*calls.borrow(), vec!["1", "2"]);
        assert_eq!(result.tests_run(), 2);
        assert!(result.should_stop());
        assert!(RestartLedger::new(options.restart_file)
            .entries()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_generative_success_writes_ledger() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let calls = log();
        let mut case = counting_generative(&calls, None);

        Runner::new(options.clone()).run(&mut case, &mut result, None).unwrap();

        assert_eq!(
            RestartLedger::new(options.restart_file).entries().unwrap(),
            vec!["m.GenTC.test_gen"]
        );
    }

    #[test]
    fn test_generative_skips() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "GenTC").generative("test_gen", |_| {
            Ok(producer(vec![
                Yield::call(|_, _| Err(Signal::inner_skip(None))),
                Yield::call(|_, _| Err(Signal::skip("shared"))),
                Yield::call(|_, _| Ok(())),
            ]))
        });

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        let reasons: Vec<&str> = result.skipped().iter().map(|s| s.reason.as_str()).collect();
        assert_eq!(reasons, vec!["test was skipped", "shared"]);
        assert_eq!(result.tests_run(), 3);
        assert_eq!(result.successes(), 1);
        assert!(result.was_successful());
    }

    #[test]
    fn test_generative_shared_skip_stops_under_exit_first() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "GenTC").generative("test_gen", |_| {
            Ok(producer(vec![
                Yield::call(|_, _| Err(Signal::skip("shared"))),
                Yield::call(|_, _| Ok(())),
            ]))
        });

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(result.tests_run(), 1);
        assert_eq!(result.successes(), 0);
    }

    #[test]
    fn test_generative_packing_violation_ends_sequence() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "GenTC").generative("test_gen", |_| {
            Ok(producer(vec![
                Yield::call(|_, _| Ok(())).keywords([("x", 1)]).arg(2),
                Yield::call(|_, _| Ok(())),
            ]))
        });

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(result.tests_run(), 0);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].info.kind, "PackingViolation");
    }

    #[test]
    fn test_generative_producer_error_ends_sequence() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "GenTC").generative("test_gen", |_| {
            Ok(try_producer(vec![
                Ok(Yield::call(|_, _| Ok(()))),
                Err(Signal::error("between items")),
                Ok(Yield::call(|_, _| Ok(()))),
            ]))
        });

        Runner::new(options).run(&mut case, &mut result, None).unwrap();

        assert_eq!(result.tests_run(), 1);
        assert_eq!(result.successes(), 1);
        assert_eq!(result.errors()[0].info.message, "between items");
    }

    #[test]
    fn test_generative_named_item_selection() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir);
        let mut result = collector(&options);
        let seen = log();
        let record = Rc::clone(&seen);
        let mut case = TestClass::new("m", "GenTC").generative("test_gen", move |_| {
            let record = Rc::clone(&record);
            let check = move |cx: &mut Cx<'_>, _: &Params| -> StepResult {
                push(&record, &cx.description());
                Ok(())
            };
            Ok(producer(vec![
                Yield::named("alpha", check.clone()),
                Yield::named("beta", check),
            ]))
        });
        let selector = PatternSelector::new("beta");

        Runner::new(options)
            .run(&mut case, &mut result, Some(&selector))
            .unwrap();

        assert_eq!(*seen.borrow(), vec!["beta"]);
        assert_eq!(result.tests_run(), 1);
        assert_eq!(case.info.description(), "test_gen (m.GenTC)");
    }

    fn named_generative() -> TestCase {
        TestClass::new("m", "GenTC").generative("test_gen", |_| {
            Ok(producer(vec![
                Yield::named("alpha", |_, _| Ok(())),
                Yield::named("beta", |_, _| Ok(())),
            ]))
        })
    }

    #[test]
    fn test_partially_selected_generative_writes_no_ledger_entry() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let ledger = RestartLedger::new(options.restart_file.clone());
        let mut runner = Runner::new(options.clone());

        let mut result = collector(&options);
        let mut case = named_generative();
        runner
            .run(&mut case, &mut result, Some(&PatternSelector::new("beta")))
            .unwrap();
        assert_eq!(result.successes(), 1);
        assert!(ledger.entries().unwrap().is_empty());

        let mut result = collector(&options);
        let mut case = named_generative();
        runner
            .run(&mut case, &mut result, Some(&PatternSelector::new("GenTC")))
            .unwrap();
        assert_eq!(result.successes(), 2);
        assert_eq!(ledger.entries().unwrap(), vec!["m.GenTC.test_gen"]);
    }

    #[test]
    fn test_empty_generative_writes_no_ledger_entry() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let mut case = TestClass::new("m", "GenTC")
            .generative("test_gen", |_| Ok(producer(Vec::<Yield>::new())));

        Runner::new(options.clone()).run(&mut case, &mut result, None).unwrap();

        assert_eq!(result.tests_run(), 0);
        assert!(RestartLedger::new(options.restart_file)
            .entries()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_run_suite_stops_after_first_failure() {
        let dir = TempDir::new().unwrap();
        let options = options_in(&dir).exit_first(true);
        let mut result = collector(&options);
        let class = TestClass::new("m", "TC");
        let mut cases = vec![
            class.case("test_a", |_| Err(Signal::failure("first"))),
            class.case("test_b", |_| Ok(())),
        ];

        let summary = Runner::new(options)
            .run_all(&mut cases, &mut result, None)
            .unwrap();

        assert_eq!(summary.tests_run, 1);
        assert_eq!(summary.failures, 1);
        assert!(summary.stopped_early);
    }
}
