//! 字段值与值集合
//!
//! [`FieldValue`] 是条件两侧操作数的带标签联合类型；比较时需要的隐式转换
//! （字符串化、数值化、真值判断、严格相等）都集中在这里，保持与表单前端
//! 运行时的行为一致。值集合中不存在的键视为 undefined，用 `Option::None` 表示。

use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// 字段值
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// 严格相等（`===`）
    ///
    /// 不做类型转换；列表和对象按引用比较，规则字面量与表单值之间永远不相等。
    /// 两侧的 None 都表示 undefined，undefined 只等于 undefined。
    pub fn strict_equals(field: Option<&FieldValue>, expected: Option<&FieldValue>) -> bool {
        let (field, expected) = match (field, expected) {
            (None, None) => return true,
            (Some(field), Some(expected)) => (field, expected),
            _ => return false,
        };

        match (field, expected) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// SameValueZero 比较（列表成员检查使用），与严格相等的区别仅在于 NaN 等于 NaN
    pub fn same_value_zero(field: Option<&FieldValue>, item: &FieldValue) -> bool {
        match (field, item) {
            (Some(Self::Number(a)), Self::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => Self::strict_equals(field, Some(item)),
        }
    }

    /// 真值判断：undefined、null、false、0、NaN、"" 为假
    pub fn is_truthy(value: Option<&FieldValue>) -> bool {
        match value {
            None | Some(Self::Null) => false,
            Some(Self::Bool(b)) => *b,
            Some(Self::Number(n)) => *n != 0.0 && !n.is_nan(),
            Some(Self::String(s)) => !s.is_empty(),
            Some(Self::List(_)) | Some(Self::Object(_)) => true,
        }
    }

    /// 字符串化（`String(value)`）
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    // 数组 join 时 null 输出为空串
                    Self::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Object(_) => "[object Object]".to_string(),
        }
    }

    /// 数值化（`Number(value)`），无法转换时为 NaN
    pub fn to_number(value: Option<&FieldValue>) -> f64 {
        match value {
            None => f64::NAN,
            Some(Self::Null) => 0.0,
            Some(Self::Bool(b)) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Some(Self::Number(n)) => *n,
            Some(Self::String(s)) => parse_number(s),
            Some(list @ Self::List(_)) => parse_number(&list.to_js_string()),
            Some(Self::Object(_)) => f64::NAN,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// 值类型名称（用于诊断信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// 数值格式化，与 `Number.prototype.toString()` 的常见输出一致
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // -0 也输出 "0"
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        // 指数形式，正指数需要显式的 '+'
        let s = format!("{:e}", n);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }

    // Display 输出最短可往返的十进制表示，大整数按 JS 的方式补零
    format!("{}", n)
}

/// 字符串转数值，规则同 `Number(string)`
fn parse_number(s: &str) -> f64 {
    // JS 的空白还包括 BOM
    let t = s.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if t.is_empty() {
        return 0.0;
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefixes, radix) in [(["0x", "0X"], 16), (["0o", "0O"], 8), (["0b", "0B"], 2)] {
        for prefix in prefixes {
            if let Some(digits) = t.strip_prefix(prefix) {
                return parse_radix(digits, radix);
            }
        }
    }

    // Rust 的浮点解析还接受 "inf"、"nan" 等写法，这里先排除
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }

    t.parse().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }

    let mut acc = 0.0_f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => acc = acc * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    acc
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// 值集合 - 字段变量名到当前值的扁平映射
///
/// 不做嵌套路径解析；需要嵌套结构时由调用方在写入前展平。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueStore {
    values: HashMap<String, FieldValue>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象字符串创建
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// 获取字段值，不存在时为 None（即 undefined）
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.values.insert(field.into(), value.into())
    }

    /// 浅合并：新键覆盖旧值，未出现的键保持原值
    pub fn merge(&mut self, partial: ValueStore) {
        self.values.extend(partial.values);
    }

    /// 合并后返回新的快照，原快照不变
    pub fn merged(&self, partial: ValueStore) -> Self {
        let mut next = self.clone();
        next.merge(partial);
        next
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }
}

impl IntoIterator for ValueStore {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl TryFrom<Value> for ValueStore {
    type Error = RuleError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(RuleError::ParseError(format!(
                "值集合必须是 JSON 对象，实际为 {}",
                FieldValue::from(other).type_name()
            ))),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ValueStore
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for ValueStore
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
