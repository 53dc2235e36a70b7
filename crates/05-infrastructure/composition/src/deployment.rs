//! 已部署的容器

use caching_abstractions::{CacheKey, CacheValue};
use caching_impl::{CacheManager, ManagedCache};
use config_impl::ConfigManager;
use di_impl::StandardBeanManager;
use infrastructure_common::{CacheError, ConfigError, ConfigOptions};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// 部署结果
///
/// 持有配置、Bean 管理器和缓存管理器。调用 [`Deployment::shutdown`] 销毁 Bean
/// 管理器并关闭全部缓存。
#[derive(Debug)]
pub struct Deployment {
    config: Arc<ConfigManager>,
    bean_manager: StandardBeanManager,
    caches: Arc<CacheManager>,
    shut_down: AtomicBool,
}

impl Deployment {
    pub(crate) fn new(config: Arc<ConfigManager>, bean_manager: StandardBeanManager, caches: Arc<CacheManager>) -> Self {
        Self {
            config,
            bean_manager,
            caches,
            shut_down: AtomicBool::new(false),
        }
    }

    /// 配置管理器
    pub fn config(&self) -> &Arc<ConfigManager> {
        &self.config
    }

    /// Bean 管理器
    pub fn bean_manager(&self) -> &StandardBeanManager {
        &self.bean_manager
    }

    /// 缓存管理器
    pub fn caches(&self) -> &Arc<CacheManager> {
        &self.caches
    }

    /// 按名称取回缓存
    pub fn cache<K: CacheKey, V: CacheValue>(&self, name: &str) -> Result<Arc<ManagedCache<K, V>>, CacheError> {
        self.caches.get_cache(name)
    }

    /// 读取配置值
    pub async fn get_config<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.config.get_value(key).await
    }

    /// 绑定强类型配置节
    pub async fn bind_section<T: ConfigOptions>(&self) -> Result<T, ConfigError> {
        self.config.bind_section().await
    }

    /// 是否已关闭
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// 关闭部署，重复调用无效果
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("开始关闭部署");
        self.bean_manager.destroy();
        self.caches.close();
        info!("部署已关闭");
    }
}
