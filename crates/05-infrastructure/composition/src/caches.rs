//! 缓存注册

use async_trait::async_trait;
use caching_abstractions::{CacheConfig, CacheKey, CacheValue, FallbackStorage};
use caching_impl::CacheManager;
use infrastructure_common::CacheError;
use std::marker::PhantomData;
use std::sync::Arc;

/// 部署时创建的缓存
///
/// 缓存的键值类型在代码中确定，存储和过期策略来自 `caches.<name>` 配置节。
#[async_trait]
pub trait CacheRegistration: Send + Sync {
    /// 缓存名称
    fn name(&self) -> &str;

    /// 按配置创建缓存
    async fn create(&self, manager: &CacheManager, config: &CacheConfig) -> Result<(), CacheError>;
}

/// 指定键值类型的缓存注册
pub struct TypedCacheRegistration<K: CacheKey, V: CacheValue> {
    name: String,
    fallback: Option<Arc<dyn FallbackStorage<K, V>>>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: CacheKey, V: CacheValue> TypedCacheRegistration<K, V> {
    /// 创建注册
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fallback: None,
            _marker: PhantomData,
        }
    }

    /// 指定后备存储
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackStorage<K, V>>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> CacheRegistration for TypedCacheRegistration<K, V> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create(&self, manager: &CacheManager, config: &CacheConfig) -> Result<(), CacheError> {
        match &self.fallback {
            Some(fallback) => {
                manager
                    .create_cache_with_fallback::<K, V>(&self.name, config, fallback.clone())
                    .await?;
            }
            None => {
                manager.create_cache::<K, V>(&self.name, config).await?;
            }
        }
        Ok(())
    }
}
