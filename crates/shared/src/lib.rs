//! 共享库
//!
//! 表单规则相关 crate 共用的配置加载与日志初始化代码。

pub mod config;
pub mod observability;
