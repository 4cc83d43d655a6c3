//! 规则存储管理
//!
//! 规则由宿主（表单定义服务、配置后台）维护，会话开始时按表单取出一次。
//! [`RuleRepository`] 是取规则的抽象，[`InMemoryRuleStore`] 使用 DashMap
//! 提供线程安全的内存实现。

use crate::config::EngineConfig;
use crate::engine::ConditionalRulesEvaluator;
use crate::error::{Result, RuleError};
use crate::models::Rule;
use crate::values::ValueStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

/// 规则仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn get(&self, rule_id: &str) -> Result<Option<Rule>>;
    /// 表单的全部规则（含停用规则），按录入顺序返回
    async fn list_by_form(&self, form_id: &str) -> Result<Vec<Rule>>;
    async fn create(&self, rule: Rule) -> Result<()>;
    async fn update(&self, rule: Rule) -> Result<()>;
    async fn delete(&self, rule_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct StoredRule {
    /// 录入序号，同优先级规则的先后顺序依赖它
    seq: u64,
    rule: Rule,
}

/// 内存规则存储
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    rules: Arc<DashMap<String, StoredRule>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 插入新规则，已存在或不合法时报错
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, target_id = %rule.target_id))]
    pub fn insert(&self, rule: Rule) -> Result<()> {
        validate(&rule)?;

        let rule_id = rule.id.clone();
        match self.rules.entry(rule_id.clone()) {
            Entry::Occupied(_) => {
                warn!("规则已存在: {}", rule_id);
                Err(RuleError::DuplicateRule(rule_id))
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredRule { seq, rule });
                info!("规则已加载: {}", rule_id);
                Ok(())
            }
        }
    }

    /// 替换已有规则，保留其录入序号
    #[instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub fn replace(&self, rule: Rule) -> Result<()> {
        validate(&rule)?;

        match self.rules.get_mut(&rule.id) {
            Some(mut stored) => {
                stored.rule = rule;
                info!("规则已更新: {}", stored.rule.id);
                Ok(())
            }
            None => {
                warn!("更新不存在的规则: {}", rule.id);
                Err(RuleError::RuleNotFound(rule.id))
            }
        }
    }

    #[instrument(skip(self))]
    pub fn remove(&self, rule_id: &str) -> Result<()> {
        if self.rules.remove(rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RuleError::RuleNotFound(rule_id.to_string()))
        }
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<Rule> {
        self.rules.get(rule_id).map(|stored| stored.rule.clone())
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    /// 表单的规则，按录入顺序
    pub fn rules_for_form(&self, form_id: &str) -> Vec<Rule> {
        let mut stored: Vec<StoredRule> = self
            .rules
            .iter()
            .filter(|entry| entry.rule.form_id.as_deref() == Some(form_id))
            .map(|entry| entry.value().clone())
            .collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.rule).collect()
    }

    /// 批量加载规则，跳过失败项，返回成功加载的规则 ID
    #[instrument(skip(self, rules))]
    pub fn load_batch(&self, rules: Vec<Rule>) -> Vec<String> {
        let mut loaded_ids = Vec::with_capacity(rules.len());
        let mut errors = Vec::new();

        for rule in rules {
            let rule_id = rule.id.clone();
            match self.insert(rule) {
                Ok(()) => loaded_ids.push(rule_id),
                Err(e) => errors.push((rule_id, e)),
            }
        }

        if !errors.is_empty() {
            warn!("批量加载部分失败: {:?}", errors);
        }

        info!("批量加载完成: {} 成功, {} 失败", loaded_ids.len(), errors.len());
        loaded_ids
    }

    /// 从 JSON 规则数组批量加载
    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<Vec<String>> {
        let rules: Vec<Rule> = serde_json::from_str(json)?;
        Ok(self.load_batch(rules))
    }

    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleStore {
    async fn get(&self, rule_id: &str) -> Result<Option<Rule>> {
        Ok(self.get_rule(rule_id))
    }

    async fn list_by_form(&self, form_id: &str) -> Result<Vec<Rule>> {
        Ok(self.rules_for_form(form_id))
    }

    async fn create(&self, rule: Rule) -> Result<()> {
        self.insert(rule)
    }

    async fn update(&self, rule: Rule) -> Result<()> {
        self.replace(rule)
    }

    async fn delete(&self, rule_id: &str) -> Result<()> {
        self.remove(rule_id)
    }
}

fn validate(rule: &Rule) -> Result<()> {
    let reason = if rule.id.is_empty() {
        "规则 ID 为空"
    } else if rule.target_id.is_empty() {
        "目标 ID 为空"
    } else {
        return Ok(());
    };

    Err(RuleError::InvalidRule {
        rule_id: rule.id.clone(),
        reason: reason.to_string(),
    })
}

/// 从仓储取出表单规则，创建会话评估器
#[instrument(skip(repo, values, config))]
pub async fn load_evaluator<R>(
    repo: &R,
    form_id: &str,
    values: ValueStore,
    config: EngineConfig,
) -> Result<ConditionalRulesEvaluator>
where
    R: RuleRepository + ?Sized,
{
    let rules = repo.list_by_form(form_id).await?;
    debug!(rules = rules.len(), "已取出表单规则");
    Ok(ConditionalRulesEvaluator::with_config(rules, values, config))
}
