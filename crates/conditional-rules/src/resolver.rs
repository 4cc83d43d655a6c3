//! 规则解析
//!
//! 一次解析 = 按优先级升序遍历所有启用规则，把命中规则的动作依次写入
//! 目标结果表。同一目标同一维度上后写覆盖先写，因此优先级最高的命中规则
//! 生效；规则冲突不报错。没有任何命中规则的目标不会出现在结果表中。

use crate::compiler::CompiledRuleSet;
use crate::executor::{RuleEvaluation, RuleExecutor};
use crate::models::TargetResult;
use crate::values::ValueStore;
use serde::Serialize;
use std::collections::HashMap;

/// 一次解析的结果：目标 ID -> 目标状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedTargets {
    results: HashMap<String, TargetResult>,
}

impl ResolvedTargets {
    /// 目标的解析结果，没有命中规则时为 None
    pub fn get(&self, target_id: &str) -> Option<&TargetResult> {
        self.results.get(target_id)
    }

    /// 目标状态，没有命中规则时为默认状态
    pub fn result_or_default(&self, target_id: &str) -> TargetResult {
        self.get(target_id).copied().unwrap_or_default()
    }

    pub fn is_visible(&self, target_id: &str) -> bool {
        self.result_or_default(target_id).visible
    }

    pub fn is_enabled(&self, target_id: &str) -> bool {
        self.result_or_default(target_id).enabled
    }

    pub fn is_required(&self, target_id: &str) -> bool {
        self.result_or_default(target_id).required
    }

    pub fn contains(&self, target_id: &str) -> bool {
        self.results.contains_key(target_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TargetResult)> {
        self.results.iter()
    }

    pub fn into_inner(self) -> HashMap<String, TargetResult> {
        self.results
    }
}

/// 执行一次完整解析
pub fn resolve(
    rules: &CompiledRuleSet,
    values: &ValueStore,
    executor: &RuleExecutor,
) -> ResolvedTargets {
    let results = rules
        .iter()
        .filter(|rule| executor.matches(rule, values))
        .fold(HashMap::new(), |mut acc: HashMap<String, TargetResult>, rule| {
            acc.entry(rule.target_id.clone())
                .or_default()
                .apply(rule.action);
            acc
        });

    ResolvedTargets { results }
}

/// 执行一次完整解析，同时返回每条规则的评估记录（按评估顺序）
pub fn resolve_with_trace(
    rules: &CompiledRuleSet,
    values: &ValueStore,
    executor: &RuleExecutor,
) -> (ResolvedTargets, Vec<RuleEvaluation>) {
    let mut resolved = ResolvedTargets::default();
    let mut evaluations = Vec::with_capacity(rules.len());

    for rule in rules.iter() {
        let evaluation = executor.execute(rule, values);
        if evaluation.matched {
            resolved
                .results
                .entry(rule.target_id.clone())
                .or_default()
                .apply(rule.action);
        }
        evaluations.push(evaluation);
    }

    (resolved, evaluations)
}
