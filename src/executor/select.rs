//! Case selection
//!
//! A [`Selector`] decides which cases, and which named sub-tests of a
//! generative case, take part in a run. No selector means everything runs.

use std::collections::HashSet;

use crate::generative::SubTest;
use crate::models::CaseInfo;
use crate::results::{LedgerError, RestartLedger};
use crate::tags::{TagExpr, TagExprError};

/// Predicate over cases and generative items
pub trait Selector {
    fn accepts_case(&self, info: &CaseInfo) -> bool;

    /// Whether a named item of a generative case is selected on its own
    fn accepts_item(&self, info: &CaseInfo, _item: &SubTest) -> bool {
        self.accepts_case(info)
    }

    /// Whether a generative case is started at all; its items are then
    /// filtered one by one
    fn admits_generative(&self, info: &CaseInfo) -> bool {
        self.accepts_case(info)
    }
}

impl<F> Selector for F
where
    F: Fn(&CaseInfo) -> bool,
{
    fn accepts_case(&self, info: &CaseInfo) -> bool {
        self(info)
    }
}

/// Cases whose tags satisfy an expression
#[derive(Clone, Debug)]
pub struct TagSelector {
    expr: TagExpr,
}

impl TagSelector {
    pub fn new(expression: &str) -> Result<Self, TagExprError> {
        Ok(Self {
            expr: TagExpr::parse(expression)?,
        })
    }
}

impl Selector for TagSelector {
    fn accepts_case(&self, info: &CaseInfo) -> bool {
        info.tags.matches_expr(&self.expr)
    }
}

/// Cases whose dotted id, or sub-tests whose name, contains a substring
#[derive(Clone, Debug)]
pub struct PatternSelector {
    pattern: String,
}

impl PatternSelector {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Selector for PatternSelector {
    fn accepts_case(&self, info: &CaseInfo) -> bool {
        info.id.to_string().contains(&self.pattern)
    }

    fn accepts_item(&self, _info: &CaseInfo, item: &SubTest) -> bool {
        item.name
            .as_deref()
            .is_some_and(|name| name.contains(&self.pattern))
    }

    /// Named items may match even when the case id does not
    fn admits_generative(&self, _info: &CaseInfo) -> bool {
        true
    }
}

/// Cases not yet recorded in the restart ledger
#[derive(Clone, Debug, Default)]
pub struct ResumeSelector {
    done: HashSet<String>,
}

impl ResumeSelector {
    pub fn new(done: HashSet<String>) -> Self {
        Self { done }
    }

    pub fn from_ledger(ledger: &RestartLedger) -> Result<Self, LedgerError> {
        Ok(Self::new(ledger.succeeded()?))
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

impl Selector for ResumeSelector {
    fn accepts_case(&self, info: &CaseInfo) -> bool {
        !self.done.contains(&info.id.to_string())
    }
}

/// Conjunction of selectors
#[derive(Default)]
pub struct AllOf {
    selectors: Vec<Box<dyn Selector>>,
}

impl AllOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: impl Selector + 'static) -> Self {
        self.selectors.push(Box::new(selector));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl Selector for AllOf {
    fn accepts_case(&self, info: &CaseInfo) -> bool {
        self.selectors.iter().all(|s| s.accepts_case(info))
    }

    fn accepts_item(&self, info: &CaseInfo, item: &SubTest) -> bool {
        self.selectors.iter().all(|s| s.accepts_item(info, item))
    }

    fn admits_generative(&self, info: &CaseInfo) -> bool {
        self.selectors.iter().all(|s| s.admits_generative(info))
    }
}
