//! # Configuration Abstractions
//!
//! 配置抽象层，定义配置提供者接口和优先级约定。
//!
//! ## 核心接口
//!
//! - [`ConfigProvider`] - 配置提供者接口
//! - [`ordinal`] - 内置提供者的默认优先级
//!
//! 多个提供者同时存在时，优先级高的提供者中的值覆盖优先级低的提供者。

pub mod provider;

pub use provider::*;
