//! Generative body execution
//!
//! Items are pulled from the producer one at a time and run before the next
//! one is pulled. The parent case does not count as a run; every executed
//! item does.

use tracing::{debug, warn};

use super::context::{Cx, RunContext};
use super::runner::{guarded, RunError};
use super::select::Selector;
use crate::models::{CaseInfo, FailureInfo, Frame, GeneratorFn, Outcome, Signal, SkipKind};
use crate::results::ResultCollector;

pub(crate) const SOURCE_FILE: &str = file!();

/// Run every selected item of a generative body
///
/// Returns whether the case completed: at least one item ran, none was
/// filtered out and every executed item succeeded. Skipped items do not
/// count against the parent.
pub(crate) fn proceed_generative(
    run: &mut RunContext,
    info: &mut CaseInfo,
    generator: &mut GeneratorFn,
    result: &mut ResultCollector,
    selector: Option<&dyn Selector>,
) -> Result<bool, RunError> {
    result.uncount_test();

    let produced = guarded("run_generator", line!(), || {
        generator(&mut Cx::new(&mut *info, &mut *run))
    });
    let mut items = match produced {
        Ok(items) => items,
        Err(signal) => {
            report_interruption(info, signal, result)?;
            return Ok(false);
        }
    };

    let exit_first = run.options().exit_first;
    let mut success = true;
    let mut executed = 0usize;
    let mut omitted = 0usize;

    while !result.should_stop() {
        let item = match guarded("next_item", line!(), || items.next().transpose()) {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(signal) => {
                report_interruption(info, signal, result)?;
                success = false;
                break;
            }
        };

        let subtest = match item.into_subtest() {
            Ok(subtest) => subtest,
            Err(violation) => {
                warn!("Malformed generative item in {}: {}", info.id, violation);
                let failure = FailureInfo::new("PackingViolation", violation.to_string())
                    .with_frame(Frame::new(SOURCE_FILE, line!(), "proceed_generative"));
                result.record_error(info, failure);
                success = false;
                break;
            }
        };

        if let Some(selector) = selector {
            let selected = selector.accepts_case(info)
                || (subtest.name.is_some() && selector.accepts_item(info, &subtest));
            if !selected {
                debug!("Omitting item {:?} of {}", subtest.name, info.id);
                omitted += 1;
                continue;
            }
        }

        result.count_subtest();
        executed += 1;
        info.set_description(subtest.name.clone());

        let step = guarded("run_item", line!(), || {
            subtest.call(&mut Cx::new(&mut *info, &mut *run))
        });
        let outcome = Outcome::classify(step)?;
        let stop = match outcome {
            Outcome::Success => {
                result.record_success(info);
                false
            }
            Outcome::Failure(failure) => {
                result.record_failure(info, failure);
                success = false;
                false
            }
            Outcome::Error(failure) => {
                result.record_error(info, failure);
                success = false;
                false
            }
            Outcome::Skip { reason, kind } => {
                result.record_skip(info, reason);
                kind == SkipKind::Test && exit_first
            }
        };
        info.set_description(None);

        if stop {
            debug!(
                "Skip in {} under stop-on-first-failure, not pulling further items",
                info.id
            );
            break;
        }
    }

    debug!(
        "{} executed {} item(s), omitted {}",
        info.id, executed, omitted
    );
    Ok(success && executed > 0 && omitted == 0)
}

/// Report a signal raised by the generator itself rather than by an item
fn report_interruption(
    info: &CaseInfo,
    signal: Signal,
    result: &mut ResultCollector,
) -> Result<(), RunError> {
    match Outcome::classify(Err(signal))? {
        Outcome::Failure(failure) => result.record_failure(info, failure),
        Outcome::Error(failure) => result.record_error(info, failure),
        Outcome::Skip { reason, .. } => result.record_skip(info, reason),
        Outcome::Success => {}
    }
    Ok(())
}
