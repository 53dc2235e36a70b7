//! 托管缓存与缓存管理器集成测试

use async_trait::async_trait;
use caching_abstractions::{
    CacheConfig, EntryStore, ExpirableEntry, ExpiryKind, ExpiryPolicy, FallbackStorage, StoreKind,
};
use caching_impl::{
    CacheManager, CompositeFallbackStorage, InMemoryEntryStore, ManagedCache, StoreFallback,
};
use infrastructure_common::CacheError;
use std::sync::Arc;
use std::time::Duration;

type Store = Arc<InMemoryEntryStore<String, String>>;

fn key(value: &str) -> String {
    value.to_string()
}

/// 三个内存后端组成的后备存储
fn three_backends() -> (Vec<Store>, Arc<CompositeFallbackStorage<String, String>>) {
    let stores: Vec<Store> = (1..=3)
        .map(|i| Arc::new(InMemoryEntryStore::new(format!("backend-{}", i))))
        .collect();
    let mut composite = CompositeFallbackStorage::<String, String>::new("composite");
    for store in &stores {
        let store: Arc<dyn EntryStore<String, String>> = store.clone();
        composite = composite.with_backend(Arc::new(StoreFallback::new(store)));
    }
    (stores, Arc::new(composite))
}

/// 所有操作都失败的后端
struct Unavailable;

#[async_trait]
impl FallbackStorage<String, String> for Unavailable {
    async fn load(&self, _key: &String) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("unavailable", "连接被拒绝"))
    }

    async fn write(&self, _key: &String, _value: &String) -> Result<(), CacheError> {
        Err(CacheError::backend("unavailable", "连接被拒绝"))
    }

    async fn delete(&self, _key: &String) -> Result<(), CacheError> {
        Err(CacheError::backend("unavailable", "连接被拒绝"))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[tokio::test]
async fn test_read_through_finds_value_in_last_backend() {
    let (stores, fallback) = three_backends();
    stores[2]
        .put_entry(&key("k"), ExpirableEntry::eternal("from-third".to_string()))
        .await
        .unwrap();

    let cache = ManagedCache::<String, String>::builder("orders")
        .fallback(fallback)
        .read_through(true)
        .build();

    assert!(!cache.contains_key(&key("k")).await.unwrap());
    assert_eq!(cache.get(&key("k")).await.unwrap().as_deref(), Some("from-third"));
    // 加载的值已放入本地存储
    assert!(cache.contains_key(&key("k")).await.unwrap());
    assert_eq!(cache.get(&key("k")).await.unwrap().as_deref(), Some("from-third"));

    let stats = cache.statistics();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(cache.get(&key("missing")).await.unwrap(), None);
}

#[tokio::test]
async fn test_read_through_disabled_ignores_fallback() {
    let (stores, fallback) = three_backends();
    stores[0]
        .put_entry(&key("k"), ExpirableEntry::eternal("v".to_string()))
        .await
        .unwrap();

    let cache = ManagedCache::<String, String>::builder("orders").fallback(fallback).build();
    assert_eq!(cache.get(&key("k")).await.unwrap(), None);
}

#[tokio::test]
async fn test_write_through_reaches_every_backend() {
    let (stores, fallback) = three_backends();
    let cache = ManagedCache::<String, String>::builder("orders")
        .fallback(fallback)
        .write_through(true)
        .build();

    cache.put(key("a"), "1".to_string()).await.unwrap();
    for store in &stores {
        assert!(store.contains_entry(&key("a")).await.unwrap(), "{}", store.name());
    }

    assert!(cache.remove(&key("a")).await.unwrap());
    for store in &stores {
        assert!(!store.contains_entry(&key("a")).await.unwrap(), "{}", store.name());
    }
}

#[tokio::test]
async fn test_write_through_failure_keeps_local_value() {
    let healthy: Store = Arc::new(InMemoryEntryStore::new("healthy"));
    let healthy_store: Arc<dyn EntryStore<String, String>> = healthy.clone();
    let fallback = CompositeFallbackStorage::<String, String>::new("composite")
        .with_backend(Arc::new(Unavailable))
        .with_backend(Arc::new(StoreFallback::new(healthy_store)));

    let cache = ManagedCache::<String, String>::builder("orders")
        .fallback(Arc::new(fallback))
        .write_through(true)
        .build();

    let error = cache.put(key("a"), "1".to_string()).await.unwrap_err();
    assert!(matches!(error, CacheError::Backend { ref backend, .. } if backend == "unavailable"));
    // 后续后端仍然写入，本地值不回滚
    assert!(healthy.contains_entry(&key("a")).await.unwrap());
    assert_eq!(cache.get(&key("a")).await.unwrap().as_deref(), Some("1"));
}

#[tokio::test]
async fn test_created_expiry_removes_entry() {
    let cache: ManagedCache<String, String> = ManagedCache::builder("short")
        .expiry(ExpiryPolicy::Created(Duration::from_millis(50)))
        .build();

    cache.put(key("a"), "1".to_string()).await.unwrap();
    assert_eq!(cache.get(&key("a")).await.unwrap().as_deref(), Some("1"));

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(cache.get(&key("a")).await.unwrap(), None);
    assert!(cache.keys().await.unwrap().is_empty());
    assert_eq!(cache.statistics().expirations, 1);
}

#[tokio::test]
async fn test_accessed_expiry_is_extended_by_reads() {
    let cache: ManagedCache<String, String> = ManagedCache::builder("sliding")
        .expiry(ExpiryPolicy::Accessed(Duration::from_millis(400)))
        .build();

    cache.put(key("a"), "1".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(cache.get(&key("a")).await.unwrap().is_some());
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(cache.get(&key("a")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_conditional_operations() {
    let cache: ManagedCache<String, String> = ManagedCache::builder("conditional").build();

    assert!(!cache.replace(key("a"), "0".to_string()).await.unwrap());
    assert!(cache.put_if_absent(key("a"), "1".to_string()).await.unwrap());
    assert!(!cache.put_if_absent(key("a"), "2".to_string()).await.unwrap());
    assert_eq!(cache.get(&key("a")).await.unwrap().as_deref(), Some("1"));

    let previous = cache.get_and_put(key("a"), "3".to_string()).await.unwrap();
    assert_eq!(previous.as_deref(), Some("1"));
    assert!(cache.replace(key("a"), "4".to_string()).await.unwrap());

    assert!(!cache.remove_if_equals(&key("a"), &"3".to_string()).await.unwrap());
    assert!(cache.remove_if_equals(&key("a"), &"4".to_string()).await.unwrap());
    assert!(!cache.contains_key(&key("a")).await.unwrap());

    cache
        .put_all(vec![(key("x"), "10".to_string()), (key("y"), "20".to_string())])
        .await
        .unwrap();
    let values = cache.get_all(&[key("x"), key("y"), key("z")]).await.unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values["y"], "20");

    let removed = cache.get_and_remove(&key("x")).await.unwrap();
    assert_eq!(removed.as_deref(), Some("10"));
    assert_eq!(cache.get_and_remove(&key("x")).await.unwrap(), None);

    cache.clear().await.unwrap();
    assert!(cache.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_statistics() {
    let cache: ManagedCache<String, String> = ManagedCache::builder("stats").build();
    cache.put(key("a"), "1".to_string()).await.unwrap();
    cache.get(&key("a")).await.unwrap();
    cache.get(&key("a")).await.unwrap();
    cache.get(&key("b")).await.unwrap();
    cache.remove(&key("a")).await.unwrap();

    let stats = cache.statistics();
    assert_eq!(stats.puts, 1);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.removals, 1);
    assert_eq!(stats.gets(), 3);
    assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);

    cache.reset_statistics();
    assert_eq!(cache.statistics().gets(), 0);

    let silent: ManagedCache<String, String> =
        ManagedCache::builder("silent").statistics_enabled(false).build();
    silent.put(key("a"), "1".to_string()).await.unwrap();
    silent.get(&key("a")).await.unwrap();
    assert_eq!(silent.statistics().gets(), 0);
}

#[tokio::test]
async fn test_closed_cache_rejects_operations() {
    let cache: ManagedCache<String, String> = ManagedCache::builder("closing").build();
    cache.put(key("a"), "1".to_string()).await.unwrap();
    cache.close();
    cache.close();

    assert!(cache.is_closed());
    assert!(matches!(
        cache.get(&key("a")).await,
        Err(CacheError::Closed { ref cache }) if cache == "closing"
    ));
    assert!(cache.put(key("b"), "2".to_string()).await.is_err());
}

#[tokio::test]
async fn test_manager_registration_and_lookup() {
    let manager = CacheManager::new();
    let config = CacheConfig::default();

    let orders = manager
        .create_cache::<String, String>("orders", &config)
        .await
        .unwrap();
    orders.put(key("a"), "1".to_string()).await.unwrap();

    let same = manager.get_cache::<String, String>("orders").unwrap();
    assert_eq!(same.get(&key("a")).await.unwrap().as_deref(), Some("1"));

    assert!(matches!(
        manager.get_cache::<String, u64>("orders"),
        Err(CacheError::TypeMismatch { .. })
    ));
    assert!(matches!(
        manager.get_cache::<String, String>("missing"),
        Err(CacheError::NotFound { .. })
    ));
    assert!(matches!(
        manager.create_cache::<String, String>("orders", &config).await,
        Err(CacheError::AlreadyExists { .. })
    ));

    manager
        .create_cache::<u64, String>("sessions", &config)
        .await
        .unwrap();
    assert_eq!(manager.cache_names(), vec!["orders".to_string(), "sessions".to_string()]);
    assert_eq!(manager.statistics()["orders"].puts, 1);

    assert!(manager.destroy_cache("sessions"));
    assert!(!manager.destroy_cache("sessions"));

    manager.close();
    assert!(orders.is_closed());
    assert!(matches!(
        manager.get_cache::<String, String>("orders"),
        Err(CacheError::Closed { .. })
    ));
}

#[tokio::test]
async fn test_manager_creates_cache_with_fallback() {
    let (stores, fallback) = three_backends();
    stores[1]
        .put_entry(&key("k"), ExpirableEntry::eternal("second".to_string()))
        .await
        .unwrap();

    let config = CacheConfig {
        read_through: true,
        write_through: true,
        ..CacheConfig::default()
    };
    let manager = CacheManager::new();
    let cache = manager
        .create_cache_with_fallback::<String, String>("layered", &config, fallback)
        .await
        .unwrap();

    assert_eq!(cache.get(&key("k")).await.unwrap().as_deref(), Some("second"));
    cache.put(key("n"), "new".to_string()).await.unwrap();
    assert!(stores[0].contains_entry(&key("n")).await.unwrap());
}

#[tokio::test]
async fn test_file_system_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        store: StoreKind::FileSystem,
        directory: Some(dir.path().join("orders")),
        expiry: ExpiryKind::Created,
        ttl_secs: 3600,
        ..CacheConfig::default()
    };

    {
        let manager = CacheManager::new();
        let cache = manager
            .create_cache::<String, String>("orders", &config)
            .await
            .unwrap();
        cache.put(key("order-1"), "paid".to_string()).await.unwrap();
        manager.close();
    }

    let manager = CacheManager::new();
    let cache = manager
        .create_cache::<String, String>("orders", &config)
        .await
        .unwrap();
    assert_eq!(cache.get(&key("order-1")).await.unwrap().as_deref(), Some("paid"));
    assert_eq!(cache.keys().await.unwrap(), vec![key("order-1")]);
}
