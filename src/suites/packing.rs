//! Generative parameter checks

use serde_json::json;
use std::collections::BTreeMap;

use crate::assertions::{ensure_eq, fail};
use crate::executor::Cx;
use crate::generative::{parse_generative_args, producer, Param, Params, Yield};
use crate::models::{StepResult, TestCase, TestClass};

const MODULE: &str = "skipaware.suites.packing";

fn keywords() -> Param {
    Param::Keywords(BTreeMap::from([("x".to_string(), json!(1))]))
}

fn star() -> Param {
    Param::StarArgs(vec![json!(2), json!(3)])
}

fn value(n: i64) -> Param {
    Param::Value(json!(n))
}

/// Name, parameter sequence, whether it unpacks
fn examples() -> Vec<(&'static str, Vec<Param>, bool)> {
    vec![
        ("positional only", vec![value(1), value(2)], true),
        ("positional then star-args", vec![value(1), star()], true),
        ("positional then keywords", vec![value(1), keywords()], true),
        ("star-args then keywords", vec![star(), keywords()], true),
        ("keywords then star-args", vec![keywords(), star()], false),
        ("two keywords", vec![keywords(), keywords()], false),
        ("positional after star-args", vec![star(), value(4)], false),
        ("positional after keywords", vec![keywords(), value(4)], false),
    ]
}

pub fn cases() -> Vec<TestCase> {
    let class = TestClass::new(MODULE, "PackingTC")
        .with_tags("generative")
        .with_source_file(file!());

    vec![
        class
            .generative("test_packing_rules", |_| {
                Ok(producer(examples().into_iter().enumerate().map(
                    |(index, (name, _, _))| Yield::named(name, check_rule).arg(index),
                )))
            })
            .with_doc("Markers must follow positional values"),
        class.generative("test_unpacked_arguments", |_| {
            Ok(producer((1..=3i64).map(|n| {
                Yield::call(check_total)
                    .arg(n)
                    .star_args([n + 1, n + 2])
                    .keywords([("total", 3 * n + 3)])
            })))
        }),
        class.generative("test_item_description", |_| {
            Ok(producer((1..=2).map(|n| {
                let name = format!("item {n}");
                let expected = name.clone();
                Yield::named(name, move |cx: &mut Cx<'_>, _: &Params| {
                    ensure_eq(cx.description(), expected.clone())
                })
            })))
        }),
    ]
}

fn check_rule(_: &mut Cx<'_>, params: &Params) -> StepResult {
    let index: usize = params.arg(0)?;
    let (_, sequence, valid) = examples()
        .into_iter()
        .nth(index)
        .ok_or_else(|| fail(format!("no packing example {index}")))?;
    ensure_eq(parse_generative_args(&sequence).is_ok(), valid)
}

fn check_total(_: &mut Cx<'_>, params: &Params) -> StepResult {
    let mut sum = 0i64;
    for index in 0..params.len() {
        sum += params.arg::<i64>(index)?;
    }
    let total: Option<i64> = params.kwarg("total")?;
    ensure_eq(Some(sum), total)
}
