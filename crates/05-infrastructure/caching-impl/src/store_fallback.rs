//! 把条目存储用作后备存储

use async_trait::async_trait;
use caching_abstractions::{CacheKey, CacheValue, EntryStore, ExpirableEntry, FallbackStorage};
use chrono::Utc;
use infrastructure_common::CacheError;
use std::sync::Arc;

/// 以条目存储为后端的后备存储
///
/// 写入的条目永不过期，读取时忽略已过期的条目
pub struct StoreFallback<K: CacheKey, V: CacheValue> {
    store: Arc<dyn EntryStore<K, V>>,
}

impl<K: CacheKey, V: CacheValue> StoreFallback<K, V> {
    /// 包装条目存储
    pub fn new(store: Arc<dyn EntryStore<K, V>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> FallbackStorage<K, V> for StoreFallback<K, V> {
    async fn load(&self, key: &K) -> Result<Option<V>, CacheError> {
        let now = Utc::now();
        Ok(self
            .store
            .get_entry(key)
            .await?
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.value))
    }

    async fn write(&self, key: &K, value: &V) -> Result<(), CacheError> {
        self.store
            .put_entry(key, ExpirableEntry::eternal(value.clone()))
            .await
    }

    async fn delete(&self, key: &K) -> Result<(), CacheError> {
        self.store.remove_entry(key).await.map(|_| ())
    }

    fn name(&self) -> &str {
        self.store.name()
    }
}
