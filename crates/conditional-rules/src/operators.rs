//! 规则操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条件操作符
///
/// 操作符集合是封闭的；无法识别的操作符保留原文放入 [`Operator::Unknown`]，
/// 评估时记录告警并返回 false。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    // 严格相等
    Equals,
    NotEquals,

    // 子串检查
    Contains,
    NotContains,

    // 数值比较
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,

    // 空值检查
    IsEmpty,
    IsNotEmpty,

    // 列表成员
    In,
    NotIn,

    Unknown(String),
}

impl Operator {
    /// 解析操作符文本
    ///
    /// 除规范名称外，还接受表单前端使用的符号写法（`=`、`!=`、`>`、`<`、
    /// `>=`、`<=`）以及 `empty` / `not_empty`。
    pub fn parse(s: &str) -> Self {
        match s {
            "equals" | "=" => Self::Equals,
            "not_equals" | "!=" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "greater_than" | ">" => Self::GreaterThan,
            "less_than" | "<" => Self::LessThan,
            "greater_than_or_equal" | ">=" => Self::GreaterThanOrEqual,
            "less_than_or_equal" | "<=" => Self::LessThanOrEqual,
            "is_empty" | "empty" => Self::IsEmpty,
            "is_not_empty" | "not_empty" => Self::IsNotEmpty,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// 规范名称（Unknown 返回原文）
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// 右操作数是否必须是列表
    pub fn expects_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 逻辑操作符（规则内条件的组合方式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}
