//! 缓存管理器

use crate::cache::{CacheHandle, ManagedCache};
use crate::file_system::FileSystemEntryStore;
use crate::memory::InMemoryEntryStore;
use caching_abstractions::{
    CacheConfig, CacheKey, CacheStatisticsSnapshot, CacheValue, EntryStore, FallbackStorage,
    StoreKind,
};
use infrastructure_common::CacheError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 按名称管理缓存
///
/// 缓存在创建时确定键值类型，[`CacheManager::get_cache`] 以错误的类型取回时返回
/// [`CacheError::TypeMismatch`]。
#[derive(Default)]
pub struct CacheManager {
    caches: RwLock<HashMap<String, Arc<dyn CacheHandle>>>,
    closed: AtomicBool,
}

impl CacheManager {
    /// 创建缓存管理器
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self, cache: &str) -> Result<(), CacheError> {
        if self.is_closed() {
            return Err(CacheError::Closed {
                cache: cache.to_string(),
            });
        }
        Ok(())
    }

    async fn open_store<K: CacheKey, V: CacheValue>(
        name: &str,
        config: &CacheConfig,
    ) -> Result<Arc<dyn EntryStore<K, V>>, CacheError> {
        let store: Arc<dyn EntryStore<K, V>> = match config.store {
            StoreKind::Memory => Arc::new(InMemoryEntryStore::new(name)),
            StoreKind::FileSystem => {
                Arc::new(FileSystemEntryStore::open(name, config.directory_for(name)).await?)
            }
        };
        Ok(store)
    }

    /// 按配置创建并注册缓存
    pub async fn create_cache<K: CacheKey, V: CacheValue>(
        &self,
        name: &str,
        config: &CacheConfig,
    ) -> Result<Arc<ManagedCache<K, V>>, CacheError> {
        self.ensure_open(name)?;
        let store = Self::open_store::<K, V>(name, config).await?;
        let cache = ManagedCache::builder(name).store(store).config(config).build();
        self.register(cache)
    }

    /// 按配置创建带后备存储的缓存
    pub async fn create_cache_with_fallback<K: CacheKey, V: CacheValue>(
        &self,
        name: &str,
        config: &CacheConfig,
        fallback: Arc<dyn FallbackStorage<K, V>>,
    ) -> Result<Arc<ManagedCache<K, V>>, CacheError> {
        self.ensure_open(name)?;
        let store = Self::open_store::<K, V>(name, config).await?;
        let cache = ManagedCache::builder(name)
            .store(store)
            .config(config)
            .fallback(fallback)
            .build();
        self.register(cache)
    }

    /// 注册已构建的缓存
    pub fn register<K: CacheKey, V: CacheValue>(
        &self,
        cache: ManagedCache<K, V>,
    ) -> Result<Arc<ManagedCache<K, V>>, CacheError> {
        let name = cache.name().to_string();
        self.ensure_open(&name)?;

        let mut caches = self.caches.write();
        if caches.contains_key(&name) {
            return Err(CacheError::AlreadyExists { cache: name });
        }
        let cache = Arc::new(cache);
        caches.insert(name.clone(), cache.clone());
        info!("注册缓存: {}", name);
        Ok(cache)
    }

    /// 按名称和键值类型取回缓存
    pub fn get_cache<K: CacheKey, V: CacheValue>(
        &self,
        name: &str,
    ) -> Result<Arc<ManagedCache<K, V>>, CacheError> {
        self.ensure_open(name)?;
        let handle = self
            .caches
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound {
                cache: name.to_string(),
            })?;
        handle
            .as_any()
            .downcast::<ManagedCache<K, V>>()
            .map_err(|_| CacheError::TypeMismatch {
                cache: name.to_string(),
            })
    }

    /// 已注册的缓存名称，按字典序
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 关闭并移除缓存
    pub fn destroy_cache(&self, name: &str) -> bool {
        match self.caches.write().remove(name) {
            Some(cache) => {
                cache.close();
                info!("销毁缓存: {}", name);
                true
            }
            None => false,
        }
    }

    /// 各缓存的统计快照
    pub fn statistics(&self) -> HashMap<String, CacheStatisticsSnapshot> {
        self.caches
            .read()
            .iter()
            .map(|(name, cache)| (name.clone(), cache.statistics()))
            .collect()
    }

    /// 关闭全部缓存，重复调用无效果
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let caches = std::mem::take(&mut *self.caches.write());
        for (name, cache) in caches {
            if cache.is_closed() {
                warn!("缓存 {} 在管理器关闭前已被关闭", name);
            }
            cache.close();
        }
        info!("缓存管理器已关闭");
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("caches", &self.cache_names())
            .field("closed", &self.is_closed())
            .finish()
    }
}
