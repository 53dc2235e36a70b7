//! # Event Dispatch
//!
//! 通用事件分发组件，负责把事件按优先级顺序投递给已注册的监听器。
//!
//! ## 核心接口
//!
//! - [`EventDispatcher`] - 监听器注册表与分发入口
//! - [`EventListener`] - 单一事件类型的监听器
//! - [`ConditionalEventListener`] - 带过滤条件的监听器
//! - [`GenericEventListener`] - 同时监听多种事件类型的监听器
//! - [`DispatchExecutor`] - 可插拔的投递执行器
//!
//! ## 投递规则
//!
//! - 优先级数值越小越先投递，未声明优先级的监听器排在所有声明了优先级的监听器之后
//! - 优先级相同时保持注册顺序
//! - 默认执行器在调用线程上逐个同步投递，监听器返回错误时立即中止本次分发

pub mod dispatcher;
pub mod executor;
pub mod listener;

pub use dispatcher::*;
pub use executor::*;
pub use listener::*;
