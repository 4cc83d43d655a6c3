//! 条件评估器
//!
//! 实现各操作符的比较语义。评估从不报错：字段缺失按 undefined 处理，
//! 无法识别的操作符记录告警并判定为不满足。

use crate::models::Condition;
use crate::operators::Operator;
use crate::values::{FieldValue, ValueStore};
use tracing::warn;

/// 条件评估器
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator {
    /// 数值 0 是否视为空值（与表单前端保持一致，默认 true）
    zero_is_empty: bool,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self {
            zero_is_empty: true,
        }
    }

    pub fn with_zero_is_empty(mut self, zero_is_empty: bool) -> Self {
        self.zero_is_empty = zero_is_empty;
        self
    }

    /// 在值集合上评估一个条件
    pub fn evaluate_condition(&self, condition: &Condition, values: &ValueStore) -> bool {
        self.evaluate(
            values.get(&condition.field_variable),
            &condition.operator,
            condition.value.as_ref(),
        )
    }

    /// 评估条件
    ///
    /// # Arguments
    /// * `field_value` - 值集合中的字段值，None 表示 undefined
    /// * `operator` - 操作符
    /// * `expected_value` - 规则中定义的右操作数，None 表示规则省略了 value
    pub fn evaluate(
        &self,
        field_value: Option<&FieldValue>,
        operator: &Operator,
        expected_value: Option<&FieldValue>,
    ) -> bool {
        match operator {
            Operator::Equals => FieldValue::strict_equals(field_value, expected_value),
            Operator::NotEquals => !FieldValue::strict_equals(field_value, expected_value),
            Operator::Contains => Self::contains(field_value, expected_value),
            Operator::NotContains => !Self::contains(field_value, expected_value),
            Operator::GreaterThan => Self::compare(field_value, expected_value, |a, b| a > b),
            Operator::LessThan => Self::compare(field_value, expected_value, |a, b| a < b),
            Operator::GreaterThanOrEqual => {
                Self::compare(field_value, expected_value, |a, b| a >= b)
            }
            Operator::LessThanOrEqual => Self::compare(field_value, expected_value, |a, b| a <= b),
            Operator::IsEmpty => self.is_empty(field_value),
            Operator::IsNotEmpty => !self.is_empty(field_value),
            Operator::In => Self::in_list(field_value, expected_value).unwrap_or(false),
            Operator::NotIn => Self::in_list(field_value, expected_value)
                .map(|found| !found)
                .unwrap_or(false),
            Operator::Unknown(raw) => {
                warn!(operator = %raw, "未知的条件操作符，条件按不满足处理");
                false
            }
        }
    }

    /// 空值判断：所有假值（undefined、null、false、0、NaN、""）都视为空
    fn is_empty(&self, value: Option<&FieldValue>) -> bool {
        if !self.zero_is_empty {
            if let Some(FieldValue::Number(n)) = value {
                if *n == 0.0 {
                    return false;
                }
            }
        }
        !FieldValue::is_truthy(value)
    }

    /// 子串包含
    ///
    /// 左侧假值字符串化为空串，右侧 undefined 和 null 同样视为空串。
    fn contains(field: Option<&FieldValue>, expected: Option<&FieldValue>) -> bool {
        let haystack = match field {
            Some(value) if FieldValue::is_truthy(field) => value.to_js_string(),
            _ => String::new(),
        };

        let needle = match expected {
            None | Some(FieldValue::Null) => String::new(),
            Some(other) => other.to_js_string(),
        };

        haystack.contains(&needle)
    }

    /// 数值比较，任一侧为 NaN 时结果为 false
    fn compare<F>(field: Option<&FieldValue>, expected: Option<&FieldValue>, cmp: F) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        let a = FieldValue::to_number(field);
        let b = FieldValue::to_number(expected);
        // f64 的比较运算对 NaN 本身就返回 false
        cmp(a, b)
    }

    /// 列表成员检查，右操作数不是列表时返回 None
    fn in_list(field: Option<&FieldValue>, expected: Option<&FieldValue>) -> Option<bool> {
        let items = expected?.as_list()?;
        Some(
            items
                .iter()
                .any(|item| FieldValue::same_value_zero(field, item)),
        )
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
