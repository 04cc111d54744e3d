//! Assertion helpers for test code
//!
//! Each helper returns a [`StepResult`] so it can be used with `?`. A
//! failing helper records the caller's location followed by its own frame,
//! with the compared values as locals.

use std::fmt::Debug;

use crate::models::{FailureInfo, Frame, Signal, StepResult};

pub(crate) const SOURCE_FILE: &str = file!();

#[track_caller]
fn failure(helper: &str, line: u32, message: String, locals: &[(&str, &dyn Debug)]) -> Signal {
    let mut frame = Frame::new(SOURCE_FILE, line, helper);
    for (name, value) in locals {
        frame = frame.with_local(*name, *value);
    }
    Signal::Failure(
        FailureInfo::new("AssertionError", message)
            .with_frame(Frame::caller("<test>"))
            .with_frame(frame),
    )
}

/// Fail unless `condition` holds
#[track_caller]
pub fn ensure(condition: bool, message: impl Into<String>) -> StepResult {
    if condition {
        return Ok(());
    }
    Err(failure("ensure", line!(), message.into(), &[]))
}

/// Fail unless `left == right`
#[track_caller]
pub fn ensure_eq<T: PartialEq + Debug>(left: T, right: T) -> StepResult {
    if left == right {
        return Ok(());
    }
    Err(failure(
        "ensure_eq",
        line!(),
        format!("{left:?} != {right:?}"),
        &[("left", &left as &dyn Debug), ("right", &right as &dyn Debug)],
    ))
}

/// Fail when `left == right`
#[track_caller]
pub fn ensure_ne<T: PartialEq + Debug>(left: T, right: T) -> StepResult {
    if left != right {
        return Ok(());
    }
    Err(failure(
        "ensure_ne",
        line!(),
        format!("{left:?} == {right:?}"),
        &[("left", &left as &dyn Debug), ("right", &right as &dyn Debug)],
    ))
}

/// Fail unless `item` is one of `items`
#[track_caller]
pub fn ensure_in<T: PartialEq + Debug>(item: &T, items: &[T]) -> StepResult {
    if items.contains(item) {
        return Ok(());
    }
    Err(failure(
        "ensure_in",
        line!(),
        format!("{item:?} not found in {items:?}"),
        &[("item", item as &dyn Debug), ("items", &items as &dyn Debug)],
    ))
}

/// Fail with `message` unconditionally
#[track_caller]
pub fn fail(message: impl Into<String>) -> Signal {
    failure("fail", line!(), message.into(), &[])
}

/// Skip the test when `condition` holds
pub fn skip_if(condition: bool, reason: impl Into<String>) -> StepResult {
    if condition {
        Err(Signal::skip(reason))
    } else {
        Ok(())
    }
}
