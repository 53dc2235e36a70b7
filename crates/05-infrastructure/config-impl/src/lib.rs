//! # Configuration Implementation
//!
//! 配置管理的具体实现，提供各种配置源和分层的配置访问。
//!
//! ## 主要组件
//!
//! - [`ConfigManager`] - 按优先级合并多个配置提供者
//! - [`TomlConfigProvider`] - TOML 配置提供者
//! - [`JsonConfigProvider`] - JSON 配置提供者
//! - [`EnvironmentConfigProvider`] - 环境变量配置提供者
//! - [`InMemoryConfigProvider`] - 代码中给出的配置

pub mod manager;
pub mod providers;
pub mod tree;

pub use manager::*;
pub use providers::*;
pub use tree::ConfigTree;
