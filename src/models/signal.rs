//! Signals raised by test code and the outcomes they classify into
//!
//! Test code never unwinds to report a result: every setup, body, sub-test
//! and teardown returns a [`StepResult`]. The engine turns that into an
//! [`Outcome`], except for [`Signal::Cancelled`] which always propagates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// Result type returned by every piece of test code
pub type StepResult = Result<(), Signal>;

/// One entry of a recorded call stack
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub file: String,
    pub line: u32,
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locals: Vec<(String, String)>,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
            locals: Vec::new(),
        }
    }

    /// Frame for the code calling the current function
    #[track_caller]
    pub fn caller(function: impl Into<String>) -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line(), function)
    }

    pub fn with_local(mut self, name: impl Into<String>, value: &dyn fmt::Debug) -> Self {
        self.locals.push((name.into(), format!("{value:?}")));
        self
    }
}

/// Recorded call stack, outermost frame first
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traceback {
    frames: Vec<Frame>,
}

impl Traceback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Record a caller of everything recorded so far
    pub fn push_outer(&mut self, frame: Frame) {
        self.frames.insert(0, frame);
    }

    /// Record a callee of everything recorded so far
    pub fn push_inner(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn innermost_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }
}

/// Details of a failure or error
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Short type-like name, e.g. `AssertionError`
    pub kind: String,
    pub message: String,
    pub traceback: Traceback,
}

impl FailureInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            traceback: Traceback::new(),
        }
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.traceback.push_inner(frame);
        self
    }

    /// Attach a local variable dump to the innermost frame
    pub fn with_local(mut self, name: impl Into<String>, value: &dyn fmt::Debug) -> Self {
        if let Some(frame) = self.traceback.innermost_mut() {
            frame.locals.push((name.into(), format!("{value:?}")));
        }
        self
    }

    /// `Kind: message` line closing a rendered traceback
    pub fn summary_line(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }
}

impl fmt::Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary_line())
    }
}

/// Why a run was cancelled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cancelled {
    /// Interrupted from the keyboard
    Interrupt,
    /// Test code asked the process to exit
    Exit(i32),
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cancelled::Interrupt => write!(f, "interrupted"),
            Cancelled::Exit(code) => write!(f, "exit requested with status {code}"),
        }
    }
}

/// What test code returns instead of succeeding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    /// An assertion about expected state did not hold
    Failure(FailureInfo),
    /// Anything else went wrong
    Error(FailureInfo),
    /// A precondition is not met; the test is skipped
    Skip(String),
    /// Skip only the current item of a generative sequence
    InnerSkip(String),
    /// Abort the entire run
    Cancelled(Cancelled),
}

impl Signal {
    /// Assertion failure located at the caller
    #[track_caller]
    pub fn failure(message: impl Into<String>) -> Self {
        Signal::Failure(
            FailureInfo::new("AssertionError", message).with_frame(Frame::caller("<unknown>")),
        )
    }

    /// Error located at the caller
    #[track_caller]
    pub fn error(message: impl Into<String>) -> Self {
        Signal::Error(FailureInfo::new("Error", message).with_frame(Frame::caller("<unknown>")))
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Signal::Skip(reason.into())
    }

    /// Skip the current generative item, `test was skipped` when no reason is given
    pub fn inner_skip(reason: Option<&str>) -> Self {
        Signal::InnerSkip(reason.unwrap_or("test was skipped").to_string())
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Signal::Cancelled(_))
    }

    pub fn info_mut(&mut self) -> Option<&mut FailureInfo> {
        match self {
            Signal::Failure(info) | Signal::Error(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Failure(info) | Signal::Error(info) => write!(f, "{info}"),
            Signal::Skip(reason) | Signal::InnerSkip(reason) => write!(f, "skipped: {reason}"),
            Signal::Cancelled(cancel) => write!(f, "cancelled: {cancel}"),
        }
    }
}

impl From<anyhow::Error> for Signal {
    #[track_caller]
    fn from(err: anyhow::Error) -> Self {
        Signal::Error(
            FailureInfo::new("Error", format!("{err:#}")).with_frame(Frame::caller("<unknown>")),
        )
    }
}

impl From<std::io::Error> for Signal {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Signal::Error(
            FailureInfo::new("IoError", err.to_string()).with_frame(Frame::caller("<unknown>")),
        )
    }
}

impl From<serde_json::Error> for Signal {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Signal::Error(
            FailureInfo::new("ValueError", err.to_string()).with_frame(Frame::caller("<unknown>")),
        )
    }
}

/// Extends results with an extra outer frame while propagating with `?`
pub trait Traced<T> {
    fn traced(self) -> Result<T, Signal>;
}

impl<T> Traced<T> for Result<T, Signal> {
    #[track_caller]
    fn traced(self) -> Result<T, Signal> {
        let frame = Frame::caller("<unknown>");
        self.map_err(|mut signal| {
            if let Some(info) = signal.info_mut() {
                info.traceback.push_outer(frame);
            }
            signal
        })
    }
}

/// Whether a skipped test was skipped as a whole or as one generative item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipKind {
    Test,
    Inner,
}

/// Classified result of one phase of a test
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(FailureInfo),
    Error(FailureInfo),
    Skip { reason: String, kind: SkipKind },
}

impl Outcome {
    /// Classify a step result; cancellation is handed back untouched
    pub fn classify(result: StepResult) -> Result<Outcome, Cancelled> {
        match result {
            Ok(()) => Ok(Outcome::Success),
            Err(Signal::Failure(info)) => Ok(Outcome::Failure(info)),
            Err(Signal::Error(info)) => Ok(Outcome::Error(info)),
            Err(Signal::Skip(reason)) => Ok(Outcome::Skip {
                reason,
                kind: SkipKind::Test,
            }),
            Err(Signal::InnerSkip(reason)) => Ok(Outcome::Skip {
                reason,
                kind: SkipKind::Inner,
            }),
            Err(Signal::Cancelled(cancel)) => Err(cancel),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip { .. })
    }
}
