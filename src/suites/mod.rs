//! Built-in self-check suites
//!
//! The cases the `skipaware` binary runs: tag matching, generative
//! parameter packing and the case lifecycle, checked with the crate's own
//! assertions through the engine.
//!
//! ## Suites
//!
//! - `tags`: expression evaluation, parse errors, inheritance, selection
//! - `packing`: marker ordering and unpacked sub-test arguments
//! - `lifecycle`: hook order, outcome classification, skip markers, data
//!   directories (one case tagged `slow`)

mod lifecycle;
mod packing;
mod tags;

use crate::models::TestCase;

/// Suite names with their case builders, in run order
pub const SUITES: &[(&str, fn() -> Vec<TestCase>)] = &[
    ("tags", tags::cases),
    ("packing", packing::cases),
    ("lifecycle", lifecycle::cases),
];

/// Every built-in case, suite by suite
pub fn all_cases() -> Vec<TestCase> {
    SUITES.iter().flat_map(|(_, build)| build()).collect()
}

/// Cases of the named suites; `None` when a name is unknown
pub fn cases_for(names: &[String]) -> Option<Vec<TestCase>> {
    let mut cases = Vec::new();
    for name in names {
        let (_, build) = SUITES.iter().find(|(suite, _)| *suite == name.as_str())?;
        cases.extend(build());
    }
    Some(cases)
}

pub fn suite_names() -> Vec<&'static str> {
    SUITES.iter().map(|(name, _)| *name).collect()
}
