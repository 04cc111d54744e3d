//! Generative tests
//!
//! A generative body returns a lazy [`Producer`] of [`Yield`] items. Each
//! item names a sub-test callable and its parameters; the engine unpacks it
//! into a [`SubTest`] and runs it before pulling the next item.
//!
//! ```ignore
//! class.generative("test_parse", |_| {
//!     Ok(producer((1..=3).map(|n| Yield::call(check_parse).arg(n))))
//! })
//! ```

mod packing;

pub use packing::{parse_generative_args, PackingViolation, Param, Params};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::executor::Cx;
use crate::models::{Signal, StepResult};

/// Sub-test callable
pub type SubTestFn = Rc<dyn Fn(&mut Cx<'_>, &Params) -> StepResult>;

/// Lazy sequence of sub-test items; an `Err` item ends the sequence
pub type Producer = Box<dyn Iterator<Item = Result<Yield, Signal>>>;

/// Wrap an infallible iterator of items into a producer
pub fn producer<I>(items: I) -> Producer
where
    I: IntoIterator<Item = Yield>,
    I::IntoIter: 'static,
{
    Box::new(items.into_iter().map(Ok))
}

/// Wrap an iterator whose items may fail between yields
pub fn try_producer<I>(items: I) -> Producer
where
    I: IntoIterator<Item = Result<Yield, Signal>>,
    I::IntoIter: 'static,
{
    Box::new(items.into_iter())
}

/// One item produced by a generative body
#[derive(Clone)]
pub struct Yield {
    name: Option<String>,
    func: SubTestFn,
    params: Vec<Param>,
}

impl Yield {
    /// Zero-argument call of `func`; add parameters with the builder methods
    pub fn call<F>(func: F) -> Self
    where
        F: Fn(&mut Cx<'_>, &Params) -> StepResult + 'static,
    {
        Self {
            name: None,
            func: Rc::new(func),
            params: Vec::new(),
        }
    }

    /// Call sharing an existing callable
    pub fn call_shared(func: &SubTestFn) -> Self {
        Self {
            name: None,
            func: Rc::clone(func),
            params: Vec::new(),
        }
    }

    /// Named item; the name replaces the case description while it runs
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Cx<'_>, &Params) -> StepResult + 'static,
    {
        Self::call(func).with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a positional value
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.params.push(Param::Value(value.into()));
        self
    }

    /// Append a star-args marker
    pub fn star_args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.params
            .push(Param::StarArgs(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Append a keywords marker
    pub fn keywords<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.params.push(Param::Keywords(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Append a raw parameter, markers included
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Unpack into a runnable sub-test
    pub fn into_subtest(self) -> Result<SubTest, PackingViolation> {
        let params = parse_generative_args(&self.params)?;
        Ok(SubTest {
            name: self.name,
            func: self.func,
            params,
        })
    }
}

impl fmt::Debug for Yield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Yield")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Unpacked sub-test descriptor
#[derive(Clone)]
pub struct SubTest {
    pub name: Option<String>,
    pub func: SubTestFn,
    pub params: Params,
}

impl SubTest {
    pub fn call(&self, cx: &mut Cx<'_>) -> StepResult {
        (self.func)(cx, &self.params)
    }
}

impl fmt::Debug for SubTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubTest")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl Params {
    /// Positional argument `index`, deserialized
    #[track_caller]
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, Signal> {
        let value = self
            .args
            .get(index)
            .ok_or_else(|| Signal::error(format!("missing positional argument {index}")))?;
        serde_json::from_value(value.clone())
            .map_err(|e| Signal::error(format!("positional argument {index}: {e}")))
    }

    /// Keyword argument `name`, deserialized; `None` when absent
    #[track_caller]
    pub fn kwarg<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Signal> {
        match self.kwargs.get(name) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Signal::error(format!("keyword argument '{name}': {e}"))),
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}
