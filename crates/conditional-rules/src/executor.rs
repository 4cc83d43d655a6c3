//! 规则执行器
//!
//! 判断单条规则在当前值集合下是否命中，可选地记录逐条件的评估追踪。
//!
//! 与短路求值不同，这里总是评估全部条件：每个未知操作符都会被告警，
//! 追踪信息也保持完整。

use crate::evaluator::ConditionEvaluator;
use crate::models::{Action, Rule};
use crate::operators::LogicalOperator;
use crate::values::ValueStore;
use serde::Serialize;

/// 单条规则的评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub target_id: String,
    pub action: Action,
    pub priority: i32,
    pub matched: bool,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
}

impl RuleEvaluation {
    fn new(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            target_id: rule.target_id.clone(),
            action: rule.action,
            priority: rule.priority,
            matched: false,
            matched_conditions: Vec::new(),
            evaluation_trace: Vec::new(),
        }
    }
}

/// 规则执行器
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExecutor {
    evaluator: ConditionEvaluator,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(mut self, evaluator: ConditionEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    /// 规则是否命中
    ///
    /// 没有条件的规则恒为命中。
    pub fn matches(&self, rule: &Rule, values: &ValueStore) -> bool {
        if rule.conditions.is_empty() {
            return true;
        }

        let results: Vec<bool> = rule
            .conditions
            .iter()
            .map(|condition| self.evaluator.evaluate_condition(condition, values))
            .collect();

        Self::combine(rule.operator, &results)
    }

    /// 执行规则评估，返回命中条件和追踪信息
    pub fn execute(&self, rule: &Rule, values: &ValueStore) -> RuleEvaluation {
        let mut result = RuleEvaluation::new(rule);

        if rule.conditions.is_empty() {
            if self.trace_enabled {
                result
                    .evaluation_trace
                    .push(format!("{}: 无条件，恒为命中", rule.id));
            }
            result.matched = true;
            return result;
        }

        let mut results = Vec::with_capacity(rule.conditions.len());
        for (i, condition) in rule.conditions.iter().enumerate() {
            let matched = self.evaluator.evaluate_condition(condition, values);

            if self.trace_enabled {
                result.evaluation_trace.push(format!(
                    "conditions[{}]: {} => {}",
                    i,
                    condition,
                    if matched { "MATCHED" } else { "NOT_MATCHED" }
                ));
            }

            if matched {
                result
                    .matched_conditions
                    .push(format!("conditions[{}].{}", i, condition));
            }

            results.push(matched);
        }

        result.matched = Self::combine(rule.operator, &results);

        if self.trace_enabled {
            result.evaluation_trace.push(format!(
                "{} 组合 {} 个条件 => {}",
                rule.operator,
                results.len(),
                if result.matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        result
    }

    fn combine(operator: LogicalOperator, results: &[bool]) -> bool {
        match operator {
            LogicalOperator::And => results.iter().all(|r| *r),
            LogicalOperator::Or => results.iter().any(|r| *r),
        }
    }
}
