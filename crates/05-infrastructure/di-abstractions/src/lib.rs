//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义 Bean 发现、元数据和实例创建的核心模型。
//!
//! ## 核心内容
//!
//! - [`AnnotatedType`] / [`BeanClass`] - 注册时声明的注解类型模型，代替运行时反射
//! - [`BeanArchiveInfo`] / [`BeanArchiveScanner`] - Bean 归档与扫描器
//! - [`Bean`] / [`ObserverMethod`] - Bean 与观察者元数据
//! - [`Producer`] / [`InjectionTarget`] / [`Context`] - 实例创建与作用域上下文
//! - [`Extension`] - 接收容器生命周期事件的扩展

pub mod annotated;
pub mod bean;
pub mod class;
pub mod container;
pub mod discovery;
pub mod events;
pub mod factory;
pub mod injection;
pub mod observer;
pub mod resolver;
pub mod scanner;

pub use annotated::*;
pub use bean::*;
pub use class::*;
pub use container::*;
pub use discovery::*;
pub use events::*;
pub use factory::*;
pub use injection::*;
pub use observer::*;
pub use resolver::*;
pub use scanner::*;
