//! Tag sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{TagExpr, TagExprError};

/// A set of labels attached to a test, matchable against a tag expression
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    labels: BTreeSet<String>,
    /// Whether a case re-uses the tags of its class
    #[serde(default = "default_inherit")]
    inherit: bool,
}

fn default_inherit() -> bool {
    true
}

impl Default for TagSet {
    fn default() -> Self {
        Self {
            labels: BTreeSet::new(),
            inherit: true,
        }
    }
}

impl TagSet {
    /// Build a tag set from any collection of labels
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            inherit: true,
        }
    }

    /// Empty tag set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    pub fn inherit(&self) -> bool {
        self.inherit
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Evaluate a tag expression against this set
    ///
    /// Unknown labels evaluate to false; only malformed expressions error.
    pub fn matches(&self, expression: &str) -> Result<bool, TagExprError> {
        let expr = TagExpr::parse(expression)?;
        Ok(self.matches_expr(&expr))
    }

    /// Evaluate an already compiled expression
    pub fn matches_expr(&self, expr: &TagExpr) -> bool {
        expr.eval(&|label| self.contains(label))
    }

    /// Union of both sets, keeping this set's `inherit` flag
    pub fn union(&self, other: &TagSet) -> TagSet {
        TagSet {
            labels: self.labels.union(&other.labels).cloned().collect(),
            inherit: self.inherit,
        }
    }

    /// Effective tags of a case given its class tags
    pub fn resolve(&self, parent: &TagSet) -> TagSet {
        if self.inherit {
            self.union(parent)
        } else {
            self.clone()
        }
    }
}

impl From<&str> for TagSet {
    fn from(label: &str) -> Self {
        TagSet::new([label])
    }
}

impl From<String> for TagSet {
    fn from(label: String) -> Self {
        TagSet::new([label])
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        TagSet::new(iter)
    }
}

impl std::ops::BitOr for &TagSet {
    type Output = TagSet;

    fn bitor(self, rhs: &TagSet) -> TagSet {
        self.union(rhs)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", labels.join(", "))
    }
}
