//! 规则引擎领域模型

use crate::operators::{LogicalOperator, Operator};
use crate::values::FieldValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// 规则作用的目标类型
///
/// 除表单的页面、分区、字段外，同一套规则也用于产品目录的选项兼容性。
/// 其余类型原样保留在 `Other` 中，存储层新增目标类型时无需修改代码。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetType {
    Page,
    Section,
    Field,
    Option,
    Other(String),
}

impl TargetType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Page => "PAGE",
            Self::Section => "SECTION",
            Self::Field => "FIELD",
            Self::Option => "OPTION",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TargetType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PAGE" => Self::Page,
            "SECTION" => Self::Section,
            "FIELD" => Self::Field,
            "OPTION" => Self::Option,
            _ => Self::Other(s),
        }
    }
}

impl From<TargetType> for String {
    fn from(target_type: TargetType) -> Self {
        match target_type {
            TargetType::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 规则命中后执行的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Show,
    Hide,
    Enable,
    Disable,
    Require,
    Optional,
}

/// 动作影响的状态维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Visible,
    Enabled,
    Required,
}

impl Action {
    pub fn dimension(self) -> Dimension {
        match self {
            Self::Show | Self::Hide => Dimension::Visible,
            Self::Enable | Self::Disable => Dimension::Enabled,
            Self::Require | Self::Optional => Dimension::Required,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Show => "SHOW",
            Self::Hide => "HIDE",
            Self::Enable => "ENABLE",
            Self::Disable => "DISABLE",
            Self::Require => "REQUIRE",
            Self::Optional => "OPTIONAL",
        };
        write!(f, "{}", s)
    }
}

/// 条件：字段当前值与字面量的一次比较
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(alias = "field")]
    pub field_variable: String,
    pub operator: Operator,
    /// 右操作数；JSON 中省略时为 None（undefined），显式的 null 为 `Some(Null)`
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<FieldValue>,
}

/// 只在键存在时调用，因此 `null` 保留为 `Some(FieldValue::Null)`
fn present_value<'de, D>(deserializer: D) -> Result<Option<FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    FieldValue::deserialize(deserializer).map(Some)
}

impl Condition {
    pub fn new(
        field_variable: impl Into<String>,
        operator: impl Into<Operator>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            field_variable: field_variable.into(),
            operator: operator.into(),
            value: Some(value.into()),
        }
    }

    /// 没有右操作数的条件（如 is_empty）
    pub fn unary(field_variable: impl Into<String>, operator: impl Into<Operator>) -> Self {
        Self {
            field_variable: field_variable.into(),
            operator: operator.into(),
            value: None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(value) = &self.value else {
            return write!(f, "{} {}", self.field_variable, self.operator);
        };

        match value {
            FieldValue::String(s) => {
                write!(f, "{} {} \"{}\"", self.field_variable, self.operator, s)
            }
            FieldValue::List(_) => write!(
                f,
                "{} {} [{}]",
                self.field_variable,
                self.operator,
                value.to_js_string()
            ),
            other => write!(
                f,
                "{} {} {}",
                self.field_variable,
                self.operator,
                other.to_js_string()
            ),
        }
    }
}

/// 规则定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    pub target_type: TargetType,
    pub target_id: String,
    pub action: Action,
    #[serde(default, deserialize_with = "one_or_many")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// `conditions` 既可以是数组，也可以是单个条件对象
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Condition>),
        One(Condition),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(conditions)) => conditions,
        Some(OneOrMany::One(condition)) => vec![condition],
        None => Vec::new(),
    })
}

impl Rule {
    pub fn new(target_type: TargetType, target_id: impl Into<String>, action: Action) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            form_id: None,
            target_type,
            target_id: target_id.into(),
            action,
            conditions: Vec::new(),
            operator: LogicalOperator::And,
            priority: 0,
            is_active: true,
        }
    }

    pub fn page(target_id: impl Into<String>, action: Action) -> Self {
        Self::new(TargetType::Page, target_id, action)
    }

    pub fn section(target_id: impl Into<String>, action: Action) -> Self {
        Self::new(TargetType::Section, target_id, action)
    }

    pub fn field(target_id: impl Into<String>, action: Action) -> Self {
        Self::new(TargetType::Field, target_id, action)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn for_form(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = Some(form_id.into());
        self
    }

    /// 追加一个条件（保持书写顺序）
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = operator;
        self
    }

    /// 任一条件满足即命中
    pub fn any(self) -> Self {
        self.with_operator(LogicalOperator::Or)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// 目标的派生状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub visible: bool,
    pub enabled: bool,
    pub required: bool,
}

impl Default for TargetResult {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            required: false,
        }
    }
}

impl TargetResult {
    /// 应用动作：只修改动作对应的一个维度
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Show => self.visible = true,
            Action::Hide => self.visible = false,
            Action::Enable => self.enabled = true,
            Action::Disable => self.enabled = false,
            Action::Require => self.required = true,
            Action::Optional => self.required = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_deserialization() {
        let json = r#"
        {
            "id": "rule-001",
            "name": "hide page 4 without second customer",
            "formId": "form-daily",
            "targetType": "PAGE",
            "targetId": "page4",
            "action": "HIDE",
            "conditions": [
                {"fieldVariable": "hasSecondCustomer", "operator": "equals", "value": "no"}
            ],
            "operator": "AND",
            "priority": 1,
            "isActive": true
        }
        "#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, "rule-001");
        assert_eq!(rule.form_id.as_deref(), Some("form-daily"));
        assert_eq!(rule.target_type, TargetType::Page);
        assert_eq!(rule.action, Action::Hide);
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.conditions[0].operator, Operator::Equals);
        assert_eq!(rule.conditions[0].value, Some(FieldValue::from("no")));
    }

    #[test]
    fn test_rule_deserialization_defaults() {
        let json = r#"
        {
            "id": "rule-002",
            "targetType": "FIELD",
            "targetId": "fieldX",
            "action": "REQUIRE"
        }
        "#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert!(rule.conditions.is_empty());
        assert_eq!(rule.operator, LogicalOperator::And);
        assert_eq!(rule.priority, 0);
        assert!(rule.is_active);
        assert!(rule.name.is_empty());
    }

    #[test]
    fn test_single_condition_object_and_field_alias() {
        let json = r#"
        {
            "id": "rule-003",
            "targetType": "SECTION",
            "targetId": "section-3",
            "action": "SHOW",
            "conditions": {"field": "Third Customer", "operator": "not_empty"}
        }
        "#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.conditions[0].field_variable, "Third Customer");
        assert_eq!(rule.conditions[0].operator, Operator::IsNotEmpty);
        assert!(rule.conditions[0].value.is_none());
    }

    #[test]
    fn test_omitted_value_differs_from_null() {
        let json = r#"[
            {"fieldVariable": "x", "operator": "equals"},
            {"fieldVariable": "x", "operator": "equals", "value": null}
        ]"#;

        let conditions: Vec<Condition> = serde_json::from_str(json).unwrap();
        assert_eq!(conditions[0].value, None);
        assert_eq!(conditions[1].value, Some(FieldValue::Null));

        let round_trip = serde_json::to_value(&conditions).unwrap();
        assert!(round_trip[0].get("value").is_none());
        assert!(round_trip[1]["value"].is_null());
        assert_eq!(conditions[0].to_string(), "x equals");
    }

    #[test]
    fn test_null_conditions() {
        let json = r#"
        {
            "id": "rule-004",
            "targetType": "PAGE",
            "targetId": "p",
            "action": "SHOW",
            "conditions": null
        }
        "#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert!(rule.conditions.is_empty());
    }

    #[test]
    fn test_other_target_type_round_trip() {
        let rule = Rule::new(TargetType::from("TAB".to_string()), "t1", Action::Disable);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["targetType"], "TAB");
        assert_eq!(json["action"], "DISABLE");

        let parsed: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.target_type, TargetType::Other("TAB".to_string()));
    }

    #[test]
    fn test_builder() {
        let rule = Rule::field("fieldX", Action::Require)
            .with_id("r1")
            .when(Condition::new("tier", Operator::Equals, "premium"))
            .when(Condition::new("qty", ">", 10))
            .any()
            .with_priority(5);

        assert_eq!(rule.id, "r1");
        assert_eq!(rule.operator, LogicalOperator::Or);
        assert_eq!(rule.conditions[1].operator, Operator::GreaterThan);
        assert_eq!(rule.priority, 5);
        assert!(rule.is_active);
        assert!(!rule.clone().inactive().is_active);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Rule::page("p1", Action::Show);
        let b = Rule::page("p1", Action::Show);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_target_result_apply() {
        let mut result = TargetResult::default();
        assert_eq!(
            result,
            TargetResult {
                visible: true,
                enabled: true,
                required: false
            }
        );

        result.apply(Action::Hide);
        result.apply(Action::Require);
        assert!(!result.visible);
        assert!(result.enabled);
        assert!(result.required);

        result.apply(Action::Optional);
        assert!(!result.required);
        assert!(!result.visible);
    }

    #[test]
    fn test_action_dimension() {
        assert_eq!(Action::Show.dimension(), Action::Hide.dimension());
        assert_eq!(Action::Disable.dimension(), Dimension::Enabled);
        assert_eq!(Action::Optional.dimension(), Dimension::Required);
    }

    #[test]
    fn test_condition_display() {
        let condition = Condition::new("qty", Operator::GreaterThan, 10);
        assert_eq!(condition.to_string(), "qty greater_than 10");

        let condition = Condition::new("tier", Operator::In, vec!["gold", "premium"]);
        assert_eq!(condition.to_string(), "tier in [gold,premium]");

        let condition = Condition::new("answer", Operator::Equals, "no");
        assert_eq!(condition.to_string(), "answer equals \"no\"");
    }
}
