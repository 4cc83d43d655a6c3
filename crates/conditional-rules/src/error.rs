//! 规则引擎错误类型
//!
//! 评估路径从不返回错误（条件失败即为 false）；这里的错误只出现在
//! 类型化边界上：规则 JSON 解析、仓储读写和配置加载。

use forms_shared::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    ParseError(String),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("规则已存在: {0}")]
    DuplicateRule(String),

    #[error("无效的规则 {rule_id}: {reason}")]
    InvalidRule { rule_id: String, reason: String },

    #[error("配置加载失败: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, RuleError>;
