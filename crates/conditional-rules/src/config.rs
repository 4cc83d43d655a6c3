//! 规则引擎配置
//!
//! 配置位于 `[rules]` 段，可通过 `forms_shared::config` 的分层机制覆盖：
//!
//! ```toml
//! [rules]
//! zero_is_empty = true
//! trace = false
//! ```
//!
//! 环境变量示例：`FORMS_RULES__TRACE=true`。

use crate::error::Result;
use crate::evaluator::ConditionEvaluator;
use crate::executor::RuleExecutor;
use forms_shared::config::{load_from_toml, load_layered, DEFAULT_ENV_PREFIX};
use serde::{Deserialize, Serialize};

/// 配置文件名（config/conditional-rules.toml）
pub const COMPONENT_NAME: &str = "conditional-rules";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// is_empty / is_not_empty 是否把数值 0 当作空值
    ///
    /// 默认 true，与表单前端已有行为一致；只有需求明确时才关闭。
    pub zero_is_empty: bool,
    /// 每次解析时以 debug 级别输出逐条规则的评估追踪
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zero_is_empty: true,
            trace: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    rules: EngineConfig,
}

impl EngineConfig {
    /// 从配置文件和环境变量加载
    pub fn load() -> Result<Self> {
        let file: ConfigFile = load_layered(COMPONENT_NAME, DEFAULT_ENV_PREFIX)?;
        Ok(file.rules)
    }

    /// 从 TOML 字符串加载
    pub fn from_toml(toml: &str) -> Result<Self> {
        let file: ConfigFile = load_from_toml(toml)?;
        Ok(file.rules)
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_zero_is_empty(mut self, zero_is_empty: bool) -> Self {
        self.zero_is_empty = zero_is_empty;
        self
    }

    /// 按配置构建条件评估器
    pub fn evaluator(&self) -> ConditionEvaluator {
        ConditionEvaluator::new().with_zero_is_empty(self.zero_is_empty)
    }

    /// 按配置构建规则执行器
    pub fn executor(&self) -> RuleExecutor {
        let executor = RuleExecutor::new().with_evaluator(self.evaluator());
        if self.trace {
            executor.with_trace()
        } else {
            executor
        }
    }
}
