//! 托管缓存
//!
//! 缓存的所有操作都建立在 [`EntryStore`] 的 `get_entry` / `put_entry` /
//! `remove_entry` / `contains_entry` 原语之上。过期条目在访问时惰性删除。

use crate::memory::InMemoryEntryStore;
use caching_abstractions::{
    CacheConfig, CacheKey, CacheStatistics, CacheStatisticsSnapshot, CacheValue, EntryStore,
    ExpirableEntry, ExpiryPolicy, FallbackStorage,
};
use chrono::{DateTime, Utc};
use infrastructure_common::CacheError;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// 类型擦除后的缓存句柄，供缓存管理器统一关闭和统计
pub trait CacheHandle: Send + Sync {
    /// 缓存名称
    fn name(&self) -> &str;

    /// 关闭缓存
    fn close(&self);

    /// 是否已关闭
    fn is_closed(&self) -> bool;

    /// 统计快照
    fn statistics(&self) -> CacheStatisticsSnapshot;

    /// 转换为 `Any`，用于取回具体类型
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// 托管缓存
pub struct ManagedCache<K: CacheKey, V: CacheValue> {
    name: String,
    store: Arc<dyn EntryStore<K, V>>,
    expiry: ExpiryPolicy,
    fallback: Option<Arc<dyn FallbackStorage<K, V>>>,
    read_through: bool,
    write_through: bool,
    statistics: CacheStatistics,
    closed: AtomicBool,
}

/// 托管缓存构建器
pub struct ManagedCacheBuilder<K: CacheKey, V: CacheValue> {
    name: String,
    store: Option<Arc<dyn EntryStore<K, V>>>,
    expiry: ExpiryPolicy,
    fallback: Option<Arc<dyn FallbackStorage<K, V>>>,
    read_through: bool,
    write_through: bool,
    statistics_enabled: bool,
}

impl<K: CacheKey, V: CacheValue> ManagedCacheBuilder<K, V> {
    /// 条目存储，默认使用内存存储
    pub fn store(mut self, store: Arc<dyn EntryStore<K, V>>) -> Self {
        self.store = Some(store);
        self
    }

    /// 过期策略
    pub fn expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    /// 后备存储
    pub fn fallback(mut self, fallback: Arc<dyn FallbackStorage<K, V>>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// 是否读穿透
    pub fn read_through(mut self, enabled: bool) -> Self {
        self.read_through = enabled;
        self
    }

    /// 是否写穿透
    pub fn write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    /// 是否启用统计
    pub fn statistics_enabled(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// 应用配置中的过期策略、读写穿透和统计设置，不包括存储类型
    pub fn config(self, config: &CacheConfig) -> Self {
        self.expiry(config.expiry_policy())
            .read_through(config.read_through)
            .write_through(config.write_through)
            .statistics_enabled(config.statistics_enabled)
    }

    /// 构建缓存
    pub fn build(self) -> ManagedCache<K, V> {
        let store: Arc<dyn EntryStore<K, V>> = match self.store {
            Some(store) => store,
            None => Arc::new(InMemoryEntryStore::new(self.name.clone())),
        };
        debug!(
            "创建缓存 {} (存储: {}, 过期策略: {:?}, 读穿透: {}, 写穿透: {})",
            self.name,
            store.name(),
            self.expiry,
            self.read_through,
            self.write_through
        );
        ManagedCache {
            name: self.name,
            store,
            expiry: self.expiry,
            fallback: self.fallback,
            read_through: self.read_through,
            write_through: self.write_through,
            statistics: CacheStatistics::new(self.statistics_enabled),
            closed: AtomicBool::new(false),
        }
    }
}

impl<K: CacheKey, V: CacheValue> ManagedCache<K, V> {
    /// 创建构建器
    pub fn builder(name: impl Into<String>) -> ManagedCacheBuilder<K, V> {
        ManagedCacheBuilder {
            name: name.into(),
            store: None,
            expiry: ExpiryPolicy::Eternal,
            fallback: None,
            read_through: false,
            write_through: false,
            statistics_enabled: true,
        }
    }

    /// 缓存名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 过期策略
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// 统计
    pub fn statistics(&self) -> CacheStatisticsSnapshot {
        self.statistics.snapshot()
    }

    /// 清零统计
    pub fn reset_statistics(&self) {
        self.statistics.reset();
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// 关闭缓存，之后的操作返回 [`CacheError::Closed`]
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("缓存 {} 已关闭", self.name);
        }
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.is_closed() {
            return Err(CacheError::Closed {
                cache: self.name.clone(),
            });
        }
        Ok(())
    }

    /// 读取未过期的条目，过期条目在此删除
    async fn live_entry(&self, key: &K, now: DateTime<Utc>) -> Result<Option<ExpirableEntry<V>>, CacheError> {
        match self.store.get_entry(key).await? {
            Some(entry) if entry.is_expired_at(now) => {
                self.store.remove_entry(key).await?;
                self.statistics.record_expiration();
                debug!("缓存 {} 的键 {} 已过期", self.name, key);
                Ok(None)
            }
            entry => Ok(entry),
        }
    }

    /// 写入本地存储，返回原有的未过期值
    async fn store_value(&self, key: &K, value: V, now: DateTime<Utc>) -> Result<Option<V>, CacheError> {
        let previous = self.live_entry(key, now).await?;
        let entry = match &previous {
            Some(existing) => ExpirableEntry {
                value,
                created_at: existing.created_at,
                last_accessed: now,
                expires_at: self
                    .expiry
                    .expiry_for_update(now)
                    .unwrap_or(existing.expires_at),
            },
            None => ExpirableEntry::new(value, now, self.expiry.expiry_for_creation(now)),
        };
        self.store.put_entry(key, entry).await?;
        Ok(previous.map(|entry| entry.value))
    }

    async fn write_through(&self, key: &K, value: &V) -> Result<(), CacheError> {
        match &self.fallback {
            Some(fallback) if self.write_through => fallback.write(key, value).await,
            _ => Ok(()),
        }
    }

    async fn delete_through(&self, key: &K) -> Result<(), CacheError> {
        match &self.fallback {
            Some(fallback) if self.write_through => fallback.delete(key).await,
            _ => Ok(()),
        }
    }

    async fn read_through(&self, key: &K, now: DateTime<Utc>) -> Result<Option<V>, CacheError> {
        let fallback = match &self.fallback {
            Some(fallback) if self.read_through => fallback,
            _ => return Ok(None),
        };
        let Some(value) = fallback.load(key).await? else {
            return Ok(None);
        };
        let entry = ExpirableEntry::new(value.clone(), now, self.expiry.expiry_for_creation(now));
        self.store.put_entry(key, entry).await?;
        debug!("缓存 {} 从 {} 读穿透加载键 {}", self.name, fallback.name(), key);
        Ok(Some(value))
    }

    /// 读取值，未命中时按配置从后备存储加载
    pub async fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        self.ensure_open()?;
        let now = Utc::now();

        if let Some(mut entry) = self.live_entry(key, now).await? {
            self.statistics.record_hit();
            let value = entry.value.clone();
            if let Some(expires_at) = self.expiry.expiry_for_access(now) {
                entry.touch(now);
                entry.expires_at = expires_at;
                self.store.put_entry(key, entry).await?;
            }
            return Ok(Some(value));
        }

        self.statistics.record_miss();
        self.read_through(key, now).await
    }

    /// 批量读取，结果只包含存在的键
    pub async fn get_all(&self, keys: &[K]) -> Result<HashMap<K, V>, CacheError> {
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key).await? {
                values.insert(key.clone(), value);
            }
        }
        Ok(values)
    }

    /// 本地是否存在未过期的键，不读穿透也不计入统计
    pub async fn contains_key(&self, key: &K) -> Result<bool, CacheError> {
        self.ensure_open()?;
        Ok(self.live_entry(key, Utc::now()).await?.is_some())
    }

    /// 写入值
    pub async fn put(&self, key: K, value: V) -> Result<(), CacheError> {
        self.ensure_open()?;
        self.store_value(&key, value.clone(), Utc::now()).await?;
        self.statistics.record_put();
        self.write_through(&key, &value).await
    }

    /// 批量写入
    pub async fn put_all(&self, entries: Vec<(K, V)>) -> Result<(), CacheError> {
        for (key, value) in entries {
            self.put(key, value).await?;
        }
        Ok(())
    }

    /// 键不存在时写入，返回是否写入
    pub async fn put_if_absent(&self, key: K, value: V) -> Result<bool, CacheError> {
        self.ensure_open()?;
        let now = Utc::now();
        if self.live_entry(&key, now).await?.is_some() {
            self.statistics.record_hit();
            return Ok(false);
        }
        self.statistics.record_miss();
        self.store_value(&key, value.clone(), now).await?;
        self.statistics.record_put();
        self.write_through(&key, &value).await?;
        Ok(true)
    }

    /// 写入值并返回原有值
    pub async fn get_and_put(&self, key: K, value: V) -> Result<Option<V>, CacheError> {
        self.ensure_open()?;
        let previous = self.store_value(&key, value.clone(), Utc::now()).await?;
        match previous {
            Some(_) => self.statistics.record_hit(),
            None => self.statistics.record_miss(),
        }
        self.statistics.record_put();
        self.write_through(&key, &value).await?;
        Ok(previous)
    }

    /// 删除键，返回本地是否存在
    ///
    /// 开启写穿透时无论本地是否存在都会删除后备存储中的键
    pub async fn remove(&self, key: &K) -> Result<bool, CacheError> {
        self.ensure_open()?;
        let existed = self.live_entry(key, Utc::now()).await?.is_some();
        if existed {
            self.store.remove_entry(key).await?;
            self.statistics.record_removal();
        }
        self.delete_through(key).await?;
        Ok(existed)
    }

    /// 当前值等于 `expected` 时删除
    pub async fn remove_if_equals(&self, key: &K, expected: &V) -> Result<bool, CacheError>
    where
        V: PartialEq,
    {
        self.ensure_open()?;
        match self.live_entry(key, Utc::now()).await? {
            Some(entry) if entry.value == *expected => {
                self.statistics.record_hit();
                self.store.remove_entry(key).await?;
                self.statistics.record_removal();
                self.delete_through(key).await?;
                Ok(true)
            }
            Some(_) => {
                self.statistics.record_hit();
                Ok(false)
            }
            None => {
                self.statistics.record_miss();
                Ok(false)
            }
        }
    }

    /// 删除键并返回原有值
    pub async fn get_and_remove(&self, key: &K) -> Result<Option<V>, CacheError> {
        self.ensure_open()?;
        let previous = self.live_entry(key, Utc::now()).await?;
        match &previous {
            Some(_) => {
                self.statistics.record_hit();
                self.store.remove_entry(key).await?;
                self.statistics.record_removal();
            }
            None => self.statistics.record_miss(),
        }
        self.delete_through(key).await?;
        Ok(previous.map(|entry| entry.value))
    }

    /// 键存在时替换，返回是否替换
    pub async fn replace(&self, key: K, value: V) -> Result<bool, CacheError> {
        self.ensure_open()?;
        let now = Utc::now();
        if self.live_entry(&key, now).await?.is_none() {
            self.statistics.record_miss();
            return Ok(false);
        }
        self.statistics.record_hit();
        self.store_value(&key, value.clone(), now).await?;
        self.statistics.record_put();
        self.write_through(&key, &value).await?;
        Ok(true)
    }

    /// 清空本地存储，不影响后备存储
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.ensure_open()?;
        self.store.clear().await?;
        info!("缓存 {} 已清空", self.name);
        Ok(())
    }

    /// 本地存储中的键，可能包括尚未清理的过期条目
    pub async fn keys(&self) -> Result<Vec<K>, CacheError> {
        self.ensure_open()?;
        self.store.keys().await
    }
}

impl<K: CacheKey, V: CacheValue> CacheHandle for ManagedCache<K, V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&self) {
        ManagedCache::close(self);
    }

    fn is_closed(&self) -> bool {
        ManagedCache::is_closed(self)
    }

    fn statistics(&self) -> CacheStatisticsSnapshot {
        self.statistics.snapshot()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<K: CacheKey, V: CacheValue> std::fmt::Debug for ManagedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedCache")
            .field("name", &self.name)
            .field("store", &self.store.name())
            .field("expiry", &self.expiry)
            .field("read_through", &self.read_through)
            .field("write_through", &self.write_through)
            .field("closed", &self.is_closed())
            .finish()
    }
}
