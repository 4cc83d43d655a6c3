//! 声明式条件规则引擎
//!
//! 根据一组规则和表单当前值，决定每个目标（页面、分区、字段）是否可见、可用、必填：
//! - JSON 规则定义和解析
//! - 规则编译（过滤停用规则、按优先级排序、诊断）
//! - 条件评估与规则解析，带可选的评估追踪
//! - 规则仓储与表单布局辅助

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod layout;
pub mod models;
pub mod operators;
pub mod resolver;
pub mod store;
pub mod values;

pub use compiler::{CompiledRule, CompiledRuleSet, DiagnosticKind, RuleCompiler, RuleDiagnostic};
pub use config::EngineConfig;
pub use engine::ConditionalRulesEvaluator;
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use executor::{RuleEvaluation, RuleExecutor};
pub use layout::{FieldLayout, FormLayout, PageLayout, Progress, SectionLayout};
pub use models::{Action, Condition, Dimension, Rule, TargetResult, TargetType};
pub use operators::{LogicalOperator, Operator};
pub use resolver::{resolve, resolve_with_trace, ResolvedTargets};
pub use store::{load_evaluator, InMemoryRuleStore, RuleRepository};
pub use values::{FieldValue, ValueStore};
