//! Test case models
//!
//! A [`TestClass`] groups cases sharing a module, tags and a skip marker.
//! Each [`TestCase`] owns its lifecycle hooks and a [`Body`], which is
//! decided when the case is built rather than probed at run time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::executor::Cx;
use crate::generative::Producer;
use crate::models::{Signal, StepResult};
use crate::tags::TagSet;

/// Setup or teardown hook
pub type Hook = Box<dyn FnMut(&mut Cx<'_>) -> StepResult>;

/// Plain test body
pub type TestFn = Box<dyn FnMut(&mut Cx<'_>) -> StepResult>;

/// Generative test body, returning the producer of sub-tests
pub type GeneratorFn = Box<dyn FnMut(&mut Cx<'_>) -> Result<Producer, Signal>>;

/// Dotted identity of a test case
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestId {
    pub module: String,
    pub class: String,
    pub method: String,
}

impl TestId {
    pub fn new(
        module: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
            method: method.into(),
        }
    }

    /// `module.Class` key identifying the class
    pub fn class_key(&self) -> String {
        format!("{}.{}", self.module, self.class)
    }

    /// Parse a dotted `module.Class.method` identity
    ///
    /// The module part may itself contain dots.
    pub fn parse(dotted: &str) -> Option<Self> {
        let (rest, method) = dotted.rsplit_once('.')?;
        let (module, class) = rest.rsplit_once('.')?;
        if module.is_empty() || class.is_empty() || method.is_empty() {
            return None;
        }
        Some(Self::new(module, class, method))
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.module, self.class, self.method)
    }
}

/// Test body, plain or generative
pub enum Body {
    Plain(TestFn),
    Generative(GeneratorFn),
}

impl Body {
    pub fn is_generative(&self) -> bool {
        matches!(self, Body::Generative(_))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Plain(_) => write!(f, "Body::Plain"),
            Body::Generative(_) => write!(f, "Body::Generative"),
        }
    }
}

/// A group of test cases sharing module, tags and skip marker
#[derive(Clone, Debug)]
pub struct TestClass {
    pub module: String,
    pub name: String,
    pub tags: TagSet,
    pub skip: Option<String>,
    /// Source file the class lives in, used to locate its data directory
    pub source_file: Option<String>,
}

impl TestClass {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            tags: TagSet::empty(),
            skip: None,
            source_file: None,
        }
    }

    pub fn with_tags(mut self, tags: impl Into<TagSet>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Skip every case of this class unconditionally
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn with_source_file(mut self, path: impl Into<String>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    /// Build a case with a plain body
    pub fn case<F>(&self, method: &str, body: F) -> TestCase
    where
        F: FnMut(&mut Cx<'_>) -> StepResult + 'static,
    {
        TestCase::new(self, method, Body::Plain(Box::new(body)))
    }

    /// Build a case with a generative body
    pub fn generative<F>(&self, method: &str, body: F) -> TestCase
    where
        F: FnMut(&mut Cx<'_>) -> Result<Producer, Signal> + 'static,
    {
        TestCase::new(self, method, Body::Generative(Box::new(body)))
    }
}

/// Everything about a case except its code
#[derive(Clone, Debug)]
pub struct CaseInfo {
    pub id: TestId,
    pub doc: Option<String>,
    /// Effective tags, class tags included when the case inherits them
    pub tags: TagSet,
    pub skip: Option<String>,
    pub class_skip: Option<String>,
    pub source_file: Option<String>,
    pub(crate) class_tags: TagSet,
    pub(crate) current_description: Option<String>,
}

impl CaseInfo {
    /// Reason of an unconditional skip marker on the class or the case
    pub fn skip_reason(&self) -> Option<&str> {
        self.class_skip.as_deref().or(self.skip.as_deref())
    }

    /// Default description: `method (module.Class)` plus the first doc line
    pub fn default_description(&self) -> String {
        let base = format!(
            "{} ({}.{})",
            self.id.method, self.id.module, self.id.class
        );
        match self.doc.as_deref().and_then(|d| d.lines().next()) {
            Some(line) if !line.trim().is_empty() => format!("{base}: {}", line.trim()),
            _ => base,
        }
    }

    /// Description currently in effect, possibly overridden by a sub-test
    pub fn description(&self) -> String {
        match &self.current_description {
            Some(descr) => descr.clone(),
            None => self.default_description(),
        }
    }

    pub fn set_description(&mut self, descr: Option<String>) {
        self.current_description = descr;
    }
}

/// One test-method invocation with its hooks and body
pub struct TestCase {
    pub info: CaseInfo,
    pub(crate) setup: Option<Hook>,
    pub(crate) teardown: Option<Hook>,
    pub(crate) body: Body,
}

impl TestCase {
    pub fn new(class: &TestClass, method: &str, body: Body) -> Self {
        Self {
            info: CaseInfo {
                id: TestId::new(&class.module, &class.name, method),
                doc: None,
                tags: class.tags.clone(),
                skip: None,
                class_skip: class.skip.clone(),
                source_file: class.source_file.clone(),
                class_tags: class.tags.clone(),
                current_description: None,
            },
            setup: None,
            teardown: None,
            body,
        }
    }

    pub fn with_setup<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Cx<'_>) -> StepResult + 'static,
    {
        self.setup = Some(Box::new(hook));
        self
    }

    pub fn with_teardown<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Cx<'_>) -> StepResult + 'static,
    {
        self.teardown = Some(Box::new(hook));
        self
    }

    /// Tag the case; class tags are kept when the set inherits
    pub fn with_tags(mut self, tags: impl Into<TagSet>) -> Self {
        let tags: TagSet = tags.into();
        self.info.tags = tags.resolve(&self.info.class_tags);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.info.doc = Some(doc.into());
        self
    }

    /// Skip this case unconditionally
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.info.skip = Some(reason.into());
        self
    }

    pub fn id(&self) -> &TestId {
        &self.info.id
    }

    pub fn is_generative(&self) -> bool {
        self.body.is_generative()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.info.id.to_string())
            .field("tags", &self.info.tags)
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info.id)
    }
}
