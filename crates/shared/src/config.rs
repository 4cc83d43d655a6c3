//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。
//! 具体的配置结构由各 crate 自行定义，这里只负责分层合并。

use config::{Config, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use std::path::Path;

pub use config::ConfigError;

/// 默认环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "FORMS";

/// 当前运行环境，读取 FORMS_ENV，缺省为 development
pub fn current_environment() -> String {
    std::env::var("FORMS_ENV").unwrap_or_else(|_| "development".to_string())
}

/// 配置文件目录，读取 CONFIG_DIR，缺省为 ./config
pub fn config_dir() -> String {
    std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string())
}

/// 从配置文件和环境变量分层加载配置
///
/// 加载顺序（后加载的会覆盖先加载的同名配置项）：
/// 1. config/default.toml（默认配置）
/// 2. config/{environment}.toml（环境特定配置）
/// 3. config/{name}.toml（组件特定配置）
/// 4. 环境变量（如 FORMS_RULES__ZERO_IS_EMPTY -> rules.zero_is_empty）
///
/// 所有文件都是可选的；目标类型应为缺失字段提供 `#[serde(default)]`。
pub fn load_layered<T: DeserializeOwned>(name: &str, env_prefix: &str) -> Result<T, ConfigError> {
    let env = current_environment();
    let dir = config_dir();

    Config::builder()
        .add_source(File::from(Path::new(&dir).join("default.toml")).required(false))
        .add_source(File::from(Path::new(&dir).join(format!("{}.toml", env))).required(false))
        .add_source(File::from(Path::new(&dir).join(format!("{}.toml", name))).required(false))
        // 双下划线分隔层级，字段名中的单下划线得以保留
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// 从 TOML 字符串加载配置（嵌入式默认值和测试使用）
pub fn load_from_toml<T: DeserializeOwned>(toml: &str) -> Result<T, ConfigError> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        limits: Limits,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Limits {
        max_rules: u32,
        strict_mode: bool,
    }

    impl Default for Limits {
        fn default() -> Self {
            Self {
                max_rules: 100,
                strict_mode: false,
            }
        }
    }

    #[test]
    fn test_load_from_toml() {
        let sample: Sample = load_from_toml(
            r#"
            name = "forms"

            [limits]
            strict_mode = true
            "#,
        )
        .unwrap();

        assert_eq!(sample.name, "forms");
        assert!(sample.limits.strict_mode);
        // 未提供的字段回落到默认值
        assert_eq!(sample.limits.max_rules, 100);
    }

    #[test]
    fn test_load_from_toml_invalid() {
        let result: Result<Sample, _> = load_from_toml("name = ");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_layered_without_files() {
        // 使用不存在的前缀，避免受到外部环境变量影响
        let sample: Sample = load_layered("no-such-component", "FORMS_TEST_UNUSED").unwrap();
        assert_eq!(sample.limits, Limits::default());
    }
}
