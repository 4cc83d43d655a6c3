//! 规则编译器
//!
//! 把会话开始时拿到的规则列表整理成可反复评估的形式：
//! 过滤停用规则、按优先级稳定排序、预提取每条规则读取的字段。
//!
//! 校验只产生诊断信息，不会拒绝规则；有问题的条件在评估时按不满足处理。

use crate::error::Result;
use crate::models::Rule;
use crate::operators::Operator;
use crate::values::FieldValue;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则
    pub rule: Rule,
    /// 规则条件中使用的所有字段变量
    pub required_fields: HashSet<String>,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.rule.id
    }

    pub fn target_id(&self) -> &str {
        &self.rule.target_id
    }
}

/// 诊断类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnknownOperator { operator: String },
    ListOperandExpected { operator: String, actual: String },
    EmptyFieldVariable,
    EmptyTargetId,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOperator { operator } => {
                write!(f, "未知的操作符 '{}'，条件将恒为不满足", operator)
            }
            Self::ListOperandExpected { operator, actual } => {
                write!(f, "{} 操作符需要数组值，实际为 {}", operator, actual)
            }
            Self::EmptyFieldVariable => write!(f, "条件的字段变量为空"),
            Self::EmptyTargetId => write!(f, "规则的目标 ID 为空"),
        }
    }
}

/// 规则诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    pub rule_id: String,
    /// 问题所在位置，如 "conditions[1]"；规则本身的问题为 "rule"
    pub path: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "规则 '{}' {}: {}", self.rule_id, self.path, self.kind)
    }
}

/// 编译后的规则集
///
/// 只包含启用的规则，按优先级升序排列；优先级相同的规则保持原有顺序。
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    rules: Vec<CompiledRule>,
    /// 字段变量 -> 依赖它的目标 ID
    field_index: HashMap<String, BTreeSet<String>>,
    diagnostics: Vec<RuleDiagnostic>,
}

impl CompiledRuleSet {
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// 按评估顺序迭代规则
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        &self.diagnostics
    }

    /// 条件中读取了该字段的规则所作用的目标
    ///
    /// 宿主可以据此判断字段变化后哪些目标需要重新渲染。
    pub fn targets_for_field(&self, field: &str) -> Vec<&str> {
        self.field_index
            .get(field)
            .map(|targets| targets.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// 被任一启用规则引用的目标
    pub fn referenced_targets(&self) -> BTreeSet<&str> {
        self.rules.iter().map(|r| r.target_id()).collect()
    }
}

/// 规则编译器
#[derive(Debug, Default)]
pub struct RuleCompiler;

impl RuleCompiler {
    pub fn new() -> Self {
        Self
    }

    /// 从 JSON 数组编译规则集
    pub fn compile_from_json(&self, json: &str) -> Result<CompiledRuleSet> {
        let rules: Vec<Rule> = serde_json::from_str(json)?;
        Ok(self.compile(rules))
    }

    /// 编译规则集
    pub fn compile(&self, rules: Vec<Rule>) -> CompiledRuleSet {
        let total = rules.len();
        let mut diagnostics = Vec::new();

        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .filter(|rule| rule.is_active)
            .map(|rule| {
                diagnostics.extend(self.validate_rule(&rule));
                let required_fields = self.extract_fields(&rule);
                CompiledRule {
                    rule,
                    required_fields,
                }
            })
            .collect();

        // sort_by_key 是稳定排序，同优先级保持输入顺序
        compiled.sort_by_key(|c| c.rule.priority);

        let mut field_index: HashMap<String, BTreeSet<String>> = HashMap::new();
        for c in &compiled {
            for field in &c.required_fields {
                field_index
                    .entry(field.clone())
                    .or_default()
                    .insert(c.rule.target_id.clone());
            }
        }

        for diagnostic in &diagnostics {
            warn!(
                rule_id = %diagnostic.rule_id,
                path = %diagnostic.path,
                "{}",
                diagnostic.kind
            );
        }

        debug!(
            total,
            active = compiled.len(),
            diagnostics = diagnostics.len(),
            "规则集编译完成"
        );

        CompiledRuleSet {
            rules: compiled,
            field_index,
            diagnostics,
        }
    }

    /// 校验规则，返回诊断信息
    fn validate_rule(&self, rule: &Rule) -> Vec<RuleDiagnostic> {
        let mut diagnostics = Vec::new();
        let mut push = |path: String, kind: DiagnosticKind| {
            diagnostics.push(RuleDiagnostic {
                rule_id: rule.id.clone(),
                path,
                kind,
            })
        };

        if rule.target_id.is_empty() {
            push("rule".to_string(), DiagnosticKind::EmptyTargetId);
        }

        for (i, cond) in rule.conditions.iter().enumerate() {
            let path = format!("conditions[{}]", i);

            if cond.field_variable.is_empty() {
                push(path.clone(), DiagnosticKind::EmptyFieldVariable);
            }

            match &cond.operator {
                Operator::Unknown(raw) => push(
                    path,
                    DiagnosticKind::UnknownOperator {
                        operator: raw.clone(),
                    },
                ),
                op if op.expects_list()
                    && cond.value.as_ref().and_then(FieldValue::as_list).is_none() =>
                {
                    push(
                        path,
                        DiagnosticKind::ListOperandExpected {
                            operator: op.to_string(),
                            actual: cond
                                .value
                                .as_ref()
                                .map_or("undefined", FieldValue::type_name)
                                .to_string(),
                        },
                    )
                }
                _ => {}
            }
        }

        diagnostics
    }

    /// 提取规则中使用的所有字段
    fn extract_fields(&self, rule: &Rule) -> HashSet<String> {
        rule.conditions
            .iter()
            .map(|cond| cond.field_variable.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Condition};

    fn sample_rules_json() -> &'static str {
        r#"
        [
            {
                "id": "rule-require",
                "targetType": "FIELD",
                "targetId": "fieldX",
                "action": "REQUIRE",
                "conditions": [
                    {"fieldVariable": "tier", "operator": "equals", "value": "premium"},
                    {"fieldVariable": "qty", "operator": "greater_than", "value": 10}
                ],
                "priority": 5
            },
            {
                "id": "rule-optional",
                "targetType": "FIELD",
                "targetId": "fieldX",
                "action": "OPTIONAL",
                "conditions": [],
                "priority": 1
            },
            {
                "id": "rule-inactive",
                "targetType": "PAGE",
                "targetId": "page2",
                "action": "HIDE",
                "conditions": [],
                "priority": 0,
                "isActive": false
            }
        ]
        "#
    }

    #[test]
    fn test_compile_from_json() {
        let compiled = RuleCompiler::new()
            .compile_from_json(sample_rules_json())
            .unwrap();

        assert_eq!(compiled.len(), 2);
        let ids: Vec<&str> = compiled.rules().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["rule-optional", "rule-require"]);

        let require = &compiled.rules()[1];
        assert_eq!(require.required_fields.len(), 2);
        assert!(require.required_fields.contains("tier"));
        assert!(require.required_fields.contains("qty"));
        assert!(compiled.diagnostics().is_empty());
    }

    #[test]
    fn test_compile_from_json_rejects_non_array() {
        let result = RuleCompiler::new().compile_from_json(r#"{"id": "rule-001"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_stable_sort_for_equal_priority() {
        let rules = vec![
            Rule::page("p", Action::Hide).with_id("b").with_priority(2),
            Rule::page("p", Action::Show).with_id("a").with_priority(1),
            Rule::page("p", Action::Show).with_id("c").with_priority(2),
            Rule::page("p", Action::Hide).with_id("d").with_priority(-1),
        ];

        let compiled = RuleCompiler::new().compile(rules);
        let ids: Vec<&str> = compiled.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_targets_for_field() {
        let rules = vec![
            Rule::page("page4", Action::Hide)
                .when(Condition::new("hasSecondCustomer", "equals", "no")),
            Rule::section("s2", Action::Show)
                .when(Condition::new("hasSecondCustomer", "equals", "yes")),
            Rule::field("f1", Action::Require).when(Condition::new("tier", "equals", "premium")),
            Rule::field("f9", Action::Require)
                .when(Condition::new("hasSecondCustomer", "is_empty", FieldValue::Null))
                .inactive(),
        ];

        let compiled = RuleCompiler::new().compile(rules);
        assert_eq!(compiled.targets_for_field("hasSecondCustomer"), vec!["page4", "s2"]);
        assert_eq!(compiled.targets_for_field("tier"), vec!["f1"]);
        assert!(compiled.targets_for_field("unknown").is_empty());
        assert_eq!(
            compiled.referenced_targets().into_iter().collect::<Vec<_>>(),
            vec!["f1", "page4", "s2"]
        );
    }

    #[test]
    fn test_diagnostics() {
        let rules = vec![
            Rule::field("", Action::Require)
                .with_id("r1")
                .when(Condition::new("tier", "like", "prem%"))
                .when(Condition::new("tier", "in", "premium"))
                .when(Condition::new("", "is_empty", FieldValue::Null)),
        ];

        let compiled = RuleCompiler::new().compile(rules);
        let diagnostics = compiled.diagnostics();

        assert_eq!(diagnostics.len(), 4);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::EmptyTargetId);
        assert_eq!(
            diagnostics[1].kind,
            DiagnosticKind::UnknownOperator {
                operator: "like".to_string()
            }
        );
        assert_eq!(diagnostics[2].path, "conditions[1]");
        assert!(matches!(
            diagnostics[2].kind,
            DiagnosticKind::ListOperandExpected { .. }
        ));
        assert_eq!(diagnostics[3].kind, DiagnosticKind::EmptyFieldVariable);
        assert!(diagnostics[1].to_string().contains("like"));

        // 诊断不影响规则被收录
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_in_without_value_is_diagnosed() {
        let rules = vec![Rule::field("f", Action::Hide).when(Condition::unary("tier", "in"))];

        let compiled = RuleCompiler::new().compile(rules);
        assert_eq!(
            compiled.diagnostics()[0].kind,
            DiagnosticKind::ListOperandExpected {
                operator: "in".to_string(),
                actual: "undefined".to_string(),
            }
        );
    }

    #[test]
    fn test_inactive_rules_are_not_validated() {
        let rules = vec![
            Rule::field("f", Action::Require)
                .when(Condition::new("x", "bogus", 1))
                .inactive(),
        ];

        let compiled = RuleCompiler::new().compile(rules);
        assert!(compiled.is_empty());
        assert!(compiled.diagnostics().is_empty());
    }
}
