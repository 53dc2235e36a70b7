//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn Beans 基础设施层的公共类型和错误定义。
//!
//! ## 核心内容
//!
//! - [`TypeInfo`] - 类型元数据
//! - [`BeanScope`] / [`Scope`] - Bean 作用域与上下文标识
//! - [`ConfigSection`] / [`ConfigOptions`] - 配置节与强类型配置
//! - [`errors`] - 各层共用的错误类型

pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
