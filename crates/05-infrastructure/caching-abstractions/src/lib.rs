//! # Caching Abstractions
//!
//! JCache 风格的缓存抽象层。
//!
//! ## 核心接口
//!
//! - [`EntryStore`] - 缓存条目存储，缓存的所有操作都建立在它的原语之上
//! - [`FallbackStorage`] - 读穿透 / 写穿透使用的后备存储
//! - [`ExpirableEntry`] / [`ExpiryPolicy`] - 带过期时间的条目与过期策略
//! - [`CacheStatistics`] - 缓存统计
//! - [`CacheConfig`] - 缓存配置

pub mod config;
pub mod entry;
pub mod fallback;
pub mod stats;
pub mod store;

pub use config::*;
pub use entry::*;
pub use fallback::*;
pub use stats::*;
pub use store::*;
