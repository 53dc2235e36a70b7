//! 缓存条目存储抽象

use crate::entry::ExpirableEntry;
use async_trait::async_trait;
use infrastructure_common::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;

/// 缓存键
///
/// 需要可序列化，文件系统存储会把键写入条目文件
pub trait CacheKey: Clone + Eq + Hash + Display + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Clone + Eq + Hash + Display + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// 缓存值
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// 缓存条目存储 trait
///
/// 存储只负责保存条目，过期判断、统计和读写穿透由缓存完成
#[async_trait]
pub trait EntryStore<K: CacheKey, V: CacheValue>: Send + Sync {
    /// 是否存在条目，不判断过期
    async fn contains_entry(&self, key: &K) -> Result<bool, CacheError>;

    /// 获取条目
    async fn get_entry(&self, key: &K) -> Result<Option<ExpirableEntry<V>>, CacheError>;

    /// 保存条目，已存在时覆盖
    async fn put_entry(&self, key: &K, entry: ExpirableEntry<V>) -> Result<(), CacheError>;

    /// 删除条目，返回条目是否存在
    async fn remove_entry(&self, key: &K) -> Result<bool, CacheError>;

    /// 删除全部条目
    async fn clear(&self) -> Result<(), CacheError>;

    /// 全部键
    async fn keys(&self) -> Result<Vec<K>, CacheError>;

    /// 存储名称
    fn name(&self) -> &str;
}
