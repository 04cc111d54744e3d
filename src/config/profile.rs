//! Run profiles
//!
//! Named presets of selection and run switches, picked with `--profile`.

use serde::{Deserialize, Serialize};

use crate::models::{RunOptions, Verbosity};
use crate::tags::{TagExpr, TagExprError};

/// Named set of run switches; unset fields leave the options untouched
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunProfile {
    /// Profile name
    pub name: String,
    /// Profile description
    #[serde(default)]
    pub description: String,
    /// Tag expression selecting cases
    #[serde(default)]
    pub tag_match: Option<String>,
    /// Substring selecting cases or named sub-tests
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub exit_first: Option<bool>,
    #[serde(default)]
    pub pdb: Option<bool>,
    #[serde(default)]
    pub verbosity: Option<Verbosity>,
}

impl RunProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Stop at the first problem, quietly
    pub fn ci() -> Self {
        Self {
            name: "ci".to_string(),
            description: "Stop at the first failure with minimal output".to_string(),
            exit_first: Some(true),
            verbosity: Some(Verbosity::Quiet),
            ..Default::default()
        }
    }

    /// Verbose output with post-mortem debugging
    pub fn debug() -> Self {
        Self {
            name: "debug".to_string(),
            description: "Verbose tracebacks and post-mortem debugging".to_string(),
            pdb: Some(true),
            verbosity: Some(Verbosity::Verbose),
            ..Default::default()
        }
    }

    /// Only cases not tagged `slow`
    pub fn quick() -> Self {
        Self {
            name: "quick".to_string(),
            description: "Skip cases tagged slow".to_string(),
            tag_match: Some("not slow".to_string()),
            ..Default::default()
        }
    }

    /// Profiles available without a config file
    pub fn builtin() -> Vec<Self> {
        vec![Self::ci(), Self::debug(), Self::quick()]
    }

    /// Check the tag expression compiles
    pub fn validate(&self) -> Result<(), TagExprError> {
        if let Some(expr) = &self.tag_match {
            TagExpr::parse(expr)?;
        }
        Ok(())
    }

    /// Apply the set fields over `options`
    pub fn apply(&self, mut options: RunOptions) -> RunOptions {
        if let Some(expr) = &self.tag_match {
            options.tag_match = Some(expr.clone());
        }
        if let Some(pattern) = &self.pattern {
            options.pattern = Some(pattern.clone());
        }
        if let Some(exit_first) = self.exit_first {
            options.exit_first = exit_first;
        }
        if let Some(pdb) = self.pdb {
            options.pdb_mode = pdb;
        }
        if let Some(verbosity) = self.verbosity {
            options.verbosity = verbosity;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let names: Vec<String> = RunProfile::builtin().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["ci", "debug", "quick"]);
        assert!(RunProfile::builtin().iter().all(|p| p.validate().is_ok()));
    }

    #[test]
    fn test_apply_only_set_fields() {
        let base = RunOptions::new().with_pattern("parse").pdb_mode(true);
        let options = RunProfile::ci().apply(base);

        assert!(options.exit_first);
        assert_eq!(options.verbosity, Verbosity::Quiet);
        assert_eq!(options.pattern.as_deref(), Some("parse"));
        assert!(options.pdb_mode);
    }

    #[test]
    fn test_validate_rejects_bad_expression() {
        let profile = RunProfile {
            tag_match: Some("slow and".to_string()),
            ..RunProfile::new("broken")
        };
        assert!(profile.validate().is_err());
    }
}
