//! Test tags
//!
//! Labels attached to test cases and classes, plus the boolean expression
//! language used to select them (`slow and not db`).

mod expr;
mod tag_set;

pub use expr::{TagExpr, TagExprError};
pub use tag_set::TagSet;
