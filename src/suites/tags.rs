//! Tag matching checks

use serde_json::json;

use crate::assertions::{ensure, ensure_eq, fail};
use crate::executor::{Cx, Selector, TagSelector};
use crate::generative::{producer, Params, Yield};
use crate::models::{StepResult, TestCase, TestClass};
use crate::tags::{TagExpr, TagSet};

const MODULE: &str = "skipaware.suites.tags";

/// Labels, expression, expected match
const EXAMPLES: &[(&[&str], &str, bool)] = &[
    (&["slow", "db"], "slow and not db", false),
    (&["slow", "db"], "slow or gui", true),
    (&["slow", "db"], "unknown_label", false),
    (&["slow", "db"], "not (gui or web)", true),
    (&["gui"], "slow or gui and not db", true),
    (&[], "not slow", true),
];

pub fn cases() -> Vec<TestCase> {
    let class = TestClass::new(MODULE, "TagMatchTC")
        .with_tags("tags")
        .with_source_file(file!());

    vec![
        class
            .generative("test_expressions", |_| {
                Ok(producer(EXAMPLES.iter().map(|(labels, expr, expected)| {
                    Yield::named(format!("{expr:?} against {labels:?}"), check_match)
                        .arg(json!(labels))
                        .arg(*expr)
                        .arg(*expected)
                })))
            })
            .with_doc("Expressions evaluate by label membership"),
        class.case("test_parse_errors", |_| {
            for expr in ["", "slow and", "(db", "db)", "slow & db"] {
                ensure(
                    TagExpr::parse(expr).is_err(),
                    format!("{expr:?} should not compile"),
                )?;
            }
            Ok(())
        }),
        class.case("test_class_tags_inherited", |_| {
            let class = TestClass::new("inner", "DbTC").with_tags(TagSet::new(["db"]));
            let inherits = class.case("test_a", |_| Ok(())).with_tags("slow");
            let isolated = class
                .case("test_b", |_| Ok(()))
                .with_tags(TagSet::new(["slow"]).with_inherit(false));

            ensure(inherits.info.tags.contains("db"), "class tag not inherited")?;
            ensure(!isolated.info.tags.contains("db"), "class tag leaked")?;
            ensure_eq(
                TagSet::new(["a"]).union(&TagSet::new(["b"])).len(),
                2,
            )
        }),
        class.case("test_selector", |_| {
            let selector = TagSelector::new("db and not slow").map_err(|e| fail(e.to_string()))?;
            let class = TestClass::new("inner", "SelTC");
            let fast = class.case("test_fast", |_| Ok(())).with_tags("db");
            let slow = class
                .case("test_slow", |_| Ok(()))
                .with_tags(TagSet::new(["db", "slow"]));

            ensure(selector.accepts_case(&fast.info), "db case rejected")?;
            ensure(!selector.accepts_case(&slow.info), "slow case accepted")
        }),
    ]
}

fn check_match(_: &mut Cx<'_>, params: &Params) -> StepResult {
    let labels: Vec<String> = params.arg(0)?;
    let expr: String = params.arg(1)?;
    let expected: bool = params.arg(2)?;

    let matched = TagSet::new(labels)
        .matches(&expr)
        .map_err(|e| fail(e.to_string()))?;
    ensure_eq(matched, expected)
}
