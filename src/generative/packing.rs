//! Parameter packing for generative sub-tests
//!
//! Positional values come first, then at most one star-args marker, then at
//! most one keywords marker. Nothing may follow a marker except the
//! keywords marker after star-args.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One parameter produced alongside a sub-test callable
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    /// A plain positional value
    Value(Value),
    /// Variadic positional values, appended after the plain ones
    StarArgs(Vec<Value>),
    /// Keyword arguments
    Keywords(BTreeMap<String, Value>),
}

/// Malformed parameter sequence in a generative test
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackingViolation {
    #[error("found star-args after keywords at parameter {index}")]
    StarArgsAfterKeywords { index: usize },

    #[error("got multiple keywords parameters at parameter {index}")]
    MultipleKeywords { index: usize },

    #[error("found positional parameter {index} after star-args or keywords")]
    PositionalAfterMarker { index: usize },
}

/// Unpacked arguments for one sub-test call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
}

const STAR_ARGS: u8 = 0b01;
const KEYWORDS: u8 = 0b10;

/// Split a parameter sequence into positional and keyword arguments
pub fn parse_generative_args(params: &[Param]) -> Result<Params, PackingViolation> {
    let mut parsed = Params::default();
    let mut flags = 0u8;

    for (index, param) in params.iter().enumerate() {
        match param {
            Param::StarArgs(values) => {
                if flags != 0 {
                    return Err(PackingViolation::StarArgsAfterKeywords { index });
                }
                flags |= STAR_ARGS;
                parsed.args.extend(values.iter().cloned());
            }
            Param::Keywords(kwargs) => {
                if flags & KEYWORDS != 0 {
                    return Err(PackingViolation::MultipleKeywords { index });
                }
                flags |= KEYWORDS;
                parsed.kwargs = kwargs.clone();
            }
            Param::Value(_) if flags != 0 => {
                return Err(PackingViolation::PositionalAfterMarker { index });
            }
            Param::Value(value) => parsed.args.push(value.clone()),
        }
    }

    Ok(parsed)
}
