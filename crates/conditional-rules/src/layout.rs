//! 表单布局辅助
//!
//! 表单由页面、分区、字段三层组成。规则只决定单个目标的状态，
//! 这里把一次解析结果套到布局上：被隐藏的页面或分区会连带隐藏其下所有字段，
//! 提交前只保留可见字段的值，并找出仍未填写的必填字段。

use crate::resolver::ResolvedTargets;
use crate::values::{FieldValue, ValueStore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormLayout {
    #[serde(default)]
    pub pages: Vec<PageLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub id: String,
    #[serde(default)]
    pub sections: Vec<SectionLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    pub id: String,
    #[serde(default)]
    pub fields: Vec<FieldLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLayout {
    pub id: String,
    /// 值集合中的键，缺省时使用字段 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// 静态必填标记，没有规则作用于该字段时生效
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_read_only: bool,
}

impl FieldLayout {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variable: None,
            is_required: false,
            is_read_only: false,
        }
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    /// 字段在值集合中的键
    pub fn key(&self) -> &str {
        self.variable.as_deref().unwrap_or(&self.id)
    }
}

/// 填写进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub filled: usize,
    pub total: usize,
}

impl FormLayout {
    pub fn new(pages: Vec<PageLayout>) -> Self {
        Self { pages }
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 可见页面，保持布局顺序
    pub fn visible_pages<'a>(&'a self, resolved: &ResolvedTargets) -> Vec<&'a PageLayout> {
        self.pages
            .iter()
            .filter(|page| resolved.is_visible(&page.id))
            .collect()
    }

    /// 页面、分区、字段三层都可见的字段
    pub fn visible_fields<'a>(&'a self, resolved: &ResolvedTargets) -> Vec<&'a FieldLayout> {
        self.visible_pages(resolved)
            .into_iter()
            .flat_map(|page| &page.sections)
            .filter(|section| resolved.is_visible(&section.id))
            .flat_map(|section| &section.fields)
            .filter(|field| resolved.is_visible(&field.id))
            .collect()
    }

    pub fn visible_field_keys<'a>(&'a self, resolved: &ResolvedTargets) -> Vec<&'a str> {
        self.visible_fields(resolved)
            .into_iter()
            .map(FieldLayout::key)
            .collect()
    }

    /// 只保留可见字段的值，用于提交
    pub fn prune_to_visible(&self, resolved: &ResolvedTargets, values: &ValueStore) -> ValueStore {
        self.visible_field_keys(resolved)
            .into_iter()
            .filter_map(|key| values.get(key).map(|value| (key, value.clone())))
            .collect()
    }

    /// 可见、必填且值为假值的字段
    pub fn missing_required_fields<'a>(
        &'a self,
        resolved: &ResolvedTargets,
        values: &ValueStore,
    ) -> Vec<&'a FieldLayout> {
        self.visible_fields(resolved)
            .into_iter()
            .filter(|field| is_field_required(field, resolved))
            .filter(|field| !FieldValue::is_truthy(values.get(field.key())))
            .collect()
    }

    pub fn is_complete(&self, resolved: &ResolvedTargets, values: &ValueStore) -> bool {
        self.missing_required_fields(resolved, values).is_empty()
    }

    /// 可见字段的填写进度
    pub fn progress(&self, resolved: &ResolvedTargets, values: &ValueStore) -> Progress {
        let fields = self.visible_fields(resolved);
        let filled = fields
            .iter()
            .filter(|field| is_filled(values.get(field.key())))
            .count();

        Progress {
            filled,
            total: fields.len(),
        }
    }
}

/// 规则结果优先于静态必填标记
pub fn is_field_required(field: &FieldLayout, resolved: &ResolvedTargets) -> bool {
    resolved
        .get(&field.id)
        .map_or(field.is_required, |result| result.required)
}

/// 被规则禁用或静态只读
pub fn is_field_disabled(field: &FieldLayout, resolved: &ResolvedTargets) -> bool {
    field.is_read_only || !resolved.is_enabled(&field.id)
}

fn is_filled(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => false,
        Some(FieldValue::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
