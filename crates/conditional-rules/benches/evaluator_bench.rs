//! 条件评估与规则解析性能基准测试

use conditional_rules::{
    Action, Condition, ConditionEvaluator, ConditionalRulesEvaluator, FieldValue, Operator, Rule,
    ValueStore,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

/// 单个操作符的评估开销
fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");
    let evaluator = ConditionEvaluator::new();

    let cases = [
        (
            "equals",
            FieldValue::from("premium"),
            Operator::Equals,
            FieldValue::from("premium"),
        ),
        (
            "greater_than_coerced",
            FieldValue::from("1500"),
            Operator::GreaterThan,
            FieldValue::from(500),
        ),
        (
            "contains",
            FieldValue::from("hello world"),
            Operator::Contains,
            FieldValue::from("world"),
        ),
        ("is_empty", FieldValue::from(0), Operator::IsEmpty, FieldValue::Null),
        (
            "in",
            FieldValue::from("d"),
            Operator::In,
            FieldValue::from(vec!["a", "b", "c", "d", "e"]),
        ),
    ];

    for (name, field, operator, expected) in &cases {
        group.bench_function(*name, |b| {
            b.iter(|| {
                evaluator.evaluate(
                    black_box(Some(field)),
                    black_box(operator),
                    black_box(Some(expected)),
                )
            })
        });
    }

    group.finish();
}

fn form_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| {
            let action = if i % 2 == 0 { Action::Hide } else { Action::Require };
            Rule::field(format!("field{}", i % 50), action)
                .with_priority((i % 7) as i32)
                .when(Condition::new(format!("var{}", i % 20), Operator::Equals, "yes"))
                .when(Condition::new("qty", Operator::GreaterThan, 10))
        })
        .collect()
}

fn form_values() -> ValueStore {
    let mut values: ValueStore = (0..20)
        .map(|i| (format!("var{}", i), if i % 3 == 0 { "yes" } else { "no" }))
        .collect();
    values.insert("qty", "15");
    values
}

/// 规则数量对完整解析的影响
fn bench_resolution_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution_scaling");

    for size in [10usize, 100, 1000].iter() {
        let evaluator = ConditionalRulesEvaluator::with_values(form_rules(*size), form_values());

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(evaluator.evaluate_rules()))
        });
    }

    group.finish();
}

/// 宿主的典型循环：写入一个值后查询一组页面
fn bench_update_then_query(c: &mut Criterion) {
    let mut evaluator = ConditionalRulesEvaluator::with_values(form_rules(200), form_values());
    let pages: Vec<String> = (0..50).map(|i| format!("field{}", i)).collect();
    let mut toggle = false;

    c.bench_function("update_then_query", |b| {
        b.iter(|| {
            toggle = !toggle;
            evaluator.update_values([("var0", if toggle { "yes" } else { "no" })]);
            black_box(evaluator.get_visible_pages(pages.iter()))
        })
    });
}

criterion_group!(
    benches,
    bench_operators,
    bench_resolution_scaling,
    bench_update_then_query
);
criterion_main!(benches);
