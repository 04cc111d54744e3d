//! Case lifecycle checks
//!
//! Most cases here drive a nested [`Runner`] over throwaway cases and check
//! what the nested collector recorded.

use std::cell::{Cell, RefCell};
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::assertions::{ensure, ensure_eq, fail};
use crate::executor::{Cx, RunError, Runner};
use crate::generative::{producer, Params, Yield};
use crate::models::{RunOptions, Signal, TestCase, TestClass};
use crate::results::ResultCollector;
use crate::utils::{create_files, Timer};

const MODULE: &str = "skipaware.suites.lifecycle";

/// Run `case` alone and hand back the collector
fn run_nested(mut case: TestCase) -> Result<ResultCollector, Signal> {
    let options = RunOptions::new();
    let mut result = ResultCollector::new(&options).with_stream(Box::new(io::sink()));
    Runner::new(options)
        .run(&mut case, &mut result, None)
        .map_err(|e| match e {
            RunError::Cancelled(cancelled) => Signal::Cancelled(cancelled),
            other => Signal::error(other.to_string()),
        })?;
    Ok(result)
}

fn inner_class() -> TestClass {
    TestClass::new("inner", "InnerTC")
}

pub fn cases() -> Vec<TestCase> {
    let class = TestClass::new(MODULE, "LifecycleTC")
        .with_tags("engine")
        .with_source_file(file!());

    let steps = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let (setup_steps, body_steps, teardown_steps) =
        (Rc::clone(&steps), Rc::clone(&steps), Rc::clone(&steps));

    vec![
        class
            .case("test_hook_order", move |_| {
                ensure_eq(body_steps.borrow().clone(), vec!["setup"])?;
                body_steps.borrow_mut().push("body");
                Ok(())
            })
            .with_setup(move |_| {
                setup_steps.borrow_mut().clear();
                setup_steps.borrow_mut().push("setup");
                Ok(())
            })
            .with_teardown(move |_| {
                ensure_eq(teardown_steps.borrow().clone(), vec!["setup", "body"])
            })
            .with_doc("Setup, body and teardown run in order"),
        class.case("test_teardown_failure_is_error", |_| {
            let case = inner_class()
                .case("test_ok", |_| Ok(()))
                .with_teardown(|_| Err(fail("teardown broke")));
            let result = run_nested(case)?;

            ensure_eq(result.errors().len(), 1)?;
            ensure_eq(result.failures().len(), 0)?;
            ensure_eq(result.successes(), 0)
        }),
        class.case("test_setup_failure_skips_body", |_| {
            let ran = Rc::new(Cell::new(false));
            let body_ran = Rc::clone(&ran);
            let case = inner_class()
                .case("test_body", move |_| {
                    body_ran.set(true);
                    Ok(())
                })
                .with_setup(|_| Err(Signal::error("no fixture")));
            let result = run_nested(case)?;

            ensure(!ran.get(), "body ran after a failed setup")?;
            ensure_eq(result.errors().len(), 1)?;
            ensure_eq(result.tests_run(), 1)
        }),
        class.case("test_generative_counts_subtests", |_| {
            let case = inner_class().generative("test_gen", |_| {
                Ok(producer((1..=3).map(|n| {
                    Yield::call(|_: &mut Cx<'_>, params: &Params| {
                        ensure(params.arg::<i64>(0)? != 2, "two is rejected")
                    })
                    .arg(n)
                })))
            });
            let result = run_nested(case)?;

            ensure_eq(result.tests_run(), 3)?;
            ensure_eq(result.failures().len(), 1)?;
            ensure_eq(result.failures()[0].info.message.as_str(), "two is rejected")
        }),
        class.case("test_skip_marker", |_| {
            let case = inner_class()
                .case("test_never", |_| Err(fail("should not run")))
                .skip("not today");
            let result = run_nested(case)?;

            ensure_eq(result.tests_run(), 0)?;
            ensure_eq(result.skipped().len(), 1)?;
            ensure_eq(result.skipped()[0].reason.as_str(), "not today")
        }),
        class.case("test_datadir", |cx| {
            let dir = cx.datadir();
            ensure(dir.ends_with("data"), format!("{} is not a data dir", dir.display()))?;
            ensure_eq(cx.datapath(&["input.csv"]), dir.join("input.csv"))
        }),
        class.case("test_scratch_directory", |cx| {
            let mut used = PathBuf::new();
            cx.with_tempdir(|_, dir| {
                create_files(&["in/a.txt", "out/"], dir)?;
                ensure(dir.join("in/a.txt").is_file(), "in/a.txt was not created")?;
                ensure(dir.join("out").is_dir(), "out/ is not a directory")?;
                used = dir.to_path_buf();
                Ok(())
            })?;
            ensure(!used.exists(), format!("{} was not removed", used.display()))
        }),
        class.case("test_description_override", |cx| {
            let default = cx.description();
            ensure(default.starts_with("test_description_override"), default)?;
            cx.set_description("overridden");
            ensure_eq(cx.description(), "overridden".to_string())
        }),
        class
            .case("test_timer_resolution", |_| {
                let timer = Timer::start("sleep");
                std::thread::sleep(Duration::from_millis(20));
                ensure(timer.elapsed_ms() >= 20, "timer ran backwards")
            })
            .with_tags("slow"),
        class
            .case("test_post_mortem_session", |_| Ok(()))
            .skip("requires an interactive terminal"),
    ]
}
