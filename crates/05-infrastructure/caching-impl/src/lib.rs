//! # 缓存具体实现
//!
//! - [`ManagedCache`] - 建立在条目存储原语之上的缓存，支持过期、读穿透和写穿透
//! - [`InMemoryEntryStore`] / [`FileSystemEntryStore`] - 条目存储
//! - [`CompositeFallbackStorage`] - 按顺序读取、向全部后端写入的组合后备存储
//! - [`CacheManager`] - 按名称管理缓存

pub mod cache;
pub mod composite;
pub mod file_system;
pub mod manager;
pub mod memory;
pub mod store_fallback;

pub use cache::{CacheHandle, ManagedCache, ManagedCacheBuilder};
pub use composite::CompositeFallbackStorage;
pub use file_system::FileSystemEntryStore;
pub use manager::CacheManager;
pub use memory::InMemoryEntryStore;
pub use store_fallback::StoreFallback;
