//! 后备存储抽象

use crate::store::{CacheKey, CacheValue};
use async_trait::async_trait;
use infrastructure_common::CacheError;

/// 后备存储 trait
///
/// 缓存未命中时从后备存储加载，写入和删除时同步到后备存储。
/// `load` 返回 `None` 表示没有该键，不是错误。
#[async_trait]
pub trait FallbackStorage<K: CacheKey, V: CacheValue>: Send + Sync {
    /// 加载值
    async fn load(&self, key: &K) -> Result<Option<V>, CacheError>;

    /// 写入值
    async fn write(&self, key: &K, value: &V) -> Result<(), CacheError>;

    /// 删除值
    async fn delete(&self, key: &K) -> Result<(), CacheError>;

    /// 存储名称
    fn name(&self) -> &str;
}
