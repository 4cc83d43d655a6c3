//! 条件规则评估器
//!
//! 一个表单会话持有一个评估器：构造时编译规则集，之后宿主在用户修改字段时
//! 调用 [`ConditionalRulesEvaluator::update_values`]，在每次渲染前调用查询方法。
//! 每次查询都基于当前值快照重新解析，没有缓存和增量状态。
//!
//! ```
//! use conditional_rules::{Action, Condition, ConditionalRulesEvaluator, Operator, Rule};
//!
//! let rules = vec![
//!     Rule::page("page4", Action::Hide)
//!         .when(Condition::new("hasSecondCustomer", Operator::Equals, "no")),
//! ];
//!
//! let mut evaluator = ConditionalRulesEvaluator::new(rules);
//! assert!(evaluator.is_page_visible("page4"));
//!
//! evaluator.update_values([("hasSecondCustomer", "no")]);
//! assert!(!evaluator.is_page_visible("page4"));
//! ```

use crate::compiler::{CompiledRuleSet, RuleCompiler};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::executor::{RuleEvaluation, RuleExecutor};
use crate::models::Rule;
use crate::resolver::{resolve, resolve_with_trace, ResolvedTargets};
use crate::values::{FieldValue, ValueStore};
use std::sync::Arc;
use tracing::debug;

/// 条件规则评估器（查询门面）
#[derive(Debug, Clone)]
pub struct ConditionalRulesEvaluator {
    rules: CompiledRuleSet,
    values: Arc<ValueStore>,
    executor: RuleExecutor,
    config: EngineConfig,
}

impl ConditionalRulesEvaluator {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self::with_values(rules, ValueStore::new())
    }

    pub fn with_values(rules: Vec<Rule>, values: ValueStore) -> Self {
        Self::with_config(rules, values, EngineConfig::default())
    }

    pub fn with_config(rules: Vec<Rule>, values: ValueStore, config: EngineConfig) -> Self {
        Self::from_compiled(RuleCompiler::new().compile(rules), values, config)
    }

    /// 从已编译的规则集创建（多个会话共享同一份规则时避免重复编译）
    pub fn from_compiled(rules: CompiledRuleSet, values: ValueStore, config: EngineConfig) -> Self {
        Self {
            rules,
            values: Arc::new(values),
            executor: config.executor(),
            config,
        }
    }

    /// 从规则 JSON 数组创建
    pub fn from_json(rules_json: &str) -> Result<Self> {
        let rules = RuleCompiler::new().compile_from_json(rules_json)?;
        Ok(Self::from_compiled(
            rules,
            ValueStore::new(),
            EngineConfig::default(),
        ))
    }

    pub fn rules(&self) -> &CompiledRuleSet {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 当前值集合
    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    /// 当前值快照，之后的 update_values 不会影响已取出的快照
    pub fn snapshot(&self) -> Arc<ValueStore> {
        Arc::clone(&self.values)
    }

    /// 浅合并新值，不触发解析
    ///
    /// 快照被其他地方持有时先复制再修改。
    pub fn update_values<I, K, V>(&mut self, partial: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Arc::make_mut(&mut self.values).extend(partial);
    }

    /// 执行一次完整解析
    ///
    /// 同一次渲染内的多个判断应基于同一个结果，避免重复解析。
    pub fn evaluate_rules(&self) -> ResolvedTargets {
        if !self.executor.trace_enabled() {
            return resolve(&self.rules, &self.values, &self.executor);
        }

        let (resolved, evaluations) = resolve_with_trace(&self.rules, &self.values, &self.executor);
        for evaluation in &evaluations {
            debug!(
                rule_id = %evaluation.rule_id,
                target_id = %evaluation.target_id,
                action = %evaluation.action,
                priority = evaluation.priority,
                matched = evaluation.matched,
                trace = ?evaluation.evaluation_trace,
                "规则评估"
            );
        }
        resolved
    }

    /// 过滤出可见页面，保持输入顺序
    pub fn get_visible_pages<I, S>(&self, page_ids: I) -> Vec<S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolved = self.evaluate_rules();
        page_ids
            .into_iter()
            .filter(|id| resolved.is_visible(id.as_ref()))
            .collect()
    }

    /// 页面是否可见，没有命中规则时默认可见
    pub fn is_page_visible(&self, page_id: &str) -> bool {
        self.evaluate_rules().is_visible(page_id)
    }

    pub fn is_section_visible(&self, section_id: &str) -> bool {
        self.evaluate_rules().is_visible(section_id)
    }

    pub fn is_field_visible(&self, field_id: &str) -> bool {
        self.evaluate_rules().is_visible(field_id)
    }

    /// 字段是否必填，没有命中规则时默认非必填
    pub fn is_field_required(&self, field_id: &str) -> bool {
        self.evaluate_rules().is_required(field_id)
    }

    /// 目标是否可用，没有命中规则时默认可用
    pub fn is_enabled(&self, target_id: &str) -> bool {
        self.evaluate_rules().is_enabled(target_id)
    }

    /// 解释目标的状态：返回作用于该目标的每条启用规则的评估记录（按评估顺序）
    pub fn explain(&self, target_id: &str) -> Vec<RuleEvaluation> {
        let executor = self.executor.with_trace();
        self.rules
            .iter()
            .filter(|rule| rule.target_id == target_id)
            .map(|rule| executor.execute(rule, &self.values))
            .collect()
    }
}
