//! 内存条目存储

use async_trait::async_trait;
use caching_abstractions::{CacheKey, CacheValue, EntryStore, ExpirableEntry};
use dashmap::DashMap;
use infrastructure_common::CacheError;

/// 内存条目存储
pub struct InMemoryEntryStore<K, V> {
    name: String,
    entries: DashMap<K, ExpirableEntry<V>>,
}

impl<K: CacheKey, V: CacheValue> InMemoryEntryStore<K, V> {
    /// 创建存储
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    /// 条目数量，包括尚未清理的过期条目
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> EntryStore<K, V> for InMemoryEntryStore<K, V> {
    async fn contains_entry(&self, key: &K) -> Result<bool, CacheError> {
        Ok(self.entries.contains_key(key))
    }

    async fn get_entry(&self, key: &K) -> Result<Option<ExpirableEntry<V>>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put_entry(&self, key: &K, entry: ExpirableEntry<V>) -> Result<(), CacheError> {
        self.entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove_entry(&self, key: &K) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<K>, CacheError> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entry_primitives() {
        let store = InMemoryEntryStore::<String, u32>::new("memory");
        let key = "answer".to_string();

        assert!(!store.contains_entry(&key).await.unwrap());
        store.put_entry(&key, ExpirableEntry::eternal(42)).await.unwrap();
        assert!(store.contains_entry(&key).await.unwrap());
        assert_eq!(store.get_entry(&key).await.unwrap().map(|e| e.value), Some(42));
        assert_eq!(store.keys().await.unwrap(), vec![key.clone()]);

        assert!(store.remove_entry(&key).await.unwrap());
        assert!(!store.remove_entry(&key).await.unwrap());
        assert!(store.is_empty());
    }
}
