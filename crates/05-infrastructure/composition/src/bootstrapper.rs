//! 容器启动器

use crate::caches::{CacheRegistration, TypedCacheRegistration};
use crate::deployment::Deployment;
use crate::logging::{init_logging, LoggingConfig};
use caching_abstractions::{CacheKey, CacheValue, CachesConfig, FallbackStorage};
use caching_impl::CacheManager;
use config_abstractions::ConfigProvider;
use config_impl::{ConfigManager, EnvironmentConfigProvider, JsonConfigProvider, TomlConfigProvider};
use di_abstractions::{BeanArchiveScanner, BeanClass, ContainerConfig, Extension};
use di_impl::StandardBeanManager;
use infrastructure_common::InfrastructureError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 日志初始化方式
#[derive(Debug, Clone)]
enum LoggingMode {
    /// 不初始化
    Disabled,
    /// 使用配置中的 `logging` 节
    FromConfig,
    /// 使用给定的配置
    Explicit(LoggingConfig),
}

/// 容器启动器
///
/// 使用建造者模式收集配置源、归档扫描器、扩展和缓存，由 [`ContainerBootstrapper::deploy`]
/// 按以下顺序完成部署：
///
/// 1. 注册配置提供者
/// 2. 初始化日志
/// 3. 绑定 `container` 配置节并创建 Bean 管理器
/// 4. 执行 Bean 发现与部署校验
/// 5. 按 `caches` 配置节创建缓存
pub struct ContainerBootstrapper {
    config_sources: Vec<Box<dyn ConfigProvider>>,
    logging: LoggingMode,
    container_config: Option<ContainerConfig>,
    scanners: Vec<Arc<dyn BeanArchiveScanner>>,
    extensions: Vec<Arc<dyn Extension>>,
    beans: Vec<BeanClass>,
    caches: Vec<Box<dyn CacheRegistration>>,
}

impl ContainerBootstrapper {
    /// 创建新的容器启动器
    pub fn new() -> Self {
        Self {
            config_sources: Vec::new(),
            logging: LoggingMode::Disabled,
            container_config: None,
            scanners: Vec::new(),
            extensions: Vec::new(),
            beans: Vec::new(),
            caches: Vec::new(),
        }
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let provider = TomlConfigProvider::new(path.as_ref())?;
        info!("添加 TOML 配置文件: {}", path.as_ref().display());
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let provider = JsonConfigProvider::new(path.as_ref())?;
        info!("添加 JSON 配置文件: {}", path.as_ref().display());
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars(mut self, prefix: impl Into<String>) -> Self {
        let provider = EnvironmentConfigProvider::new(prefix);
        info!("添加环境变量配置源，前缀: {}", provider.prefix());
        self.config_sources.push(Box::new(provider));
        self
    }

    /// 添加自定义配置提供者
    pub fn add_config_provider<T: ConfigProvider + 'static>(mut self, provider: T) -> Self {
        info!("添加自定义配置提供者: {}", provider.name());
        self.config_sources.push(Box::new(provider));
        self
    }

    /// 使用给定的日志配置
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = LoggingMode::Explicit(config);
        self
    }

    /// 使用配置中的 `logging` 节初始化日志
    pub fn with_configured_logging(mut self) -> Self {
        self.logging = LoggingMode::FromConfig;
        self
    }

    /// 使用给定的容器配置，不再读取 `container` 配置节
    pub fn with_container_config(mut self, config: ContainerConfig) -> Self {
        self.container_config = Some(config);
        self
    }

    /// 添加 Bean 归档扫描器
    pub fn add_scanner(mut self, scanner: Arc<dyn BeanArchiveScanner>) -> Self {
        debug!("添加归档扫描器: {}", scanner.name());
        self.scanners.push(scanner);
        self
    }

    /// 添加扩展
    pub fn add_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        debug!("添加扩展: {}", extension.name());
        self.extensions.push(extension);
        self
    }

    /// 直接注册 Bean 类
    pub fn add_bean(mut self, class: BeanClass) -> Self {
        self.beans.push(class);
        self
    }

    /// 添加缓存
    pub fn add_cache<K: CacheKey, V: CacheValue>(mut self, name: impl Into<String>) -> Self {
        self.caches.push(Box::new(TypedCacheRegistration::<K, V>::new(name)));
        self
    }

    /// 添加带后备存储的缓存
    pub fn add_cache_with_fallback<K: CacheKey, V: CacheValue>(
        mut self,
        name: impl Into<String>,
        fallback: Arc<dyn FallbackStorage<K, V>>,
    ) -> Self {
        self.caches
            .push(Box::new(TypedCacheRegistration::new(name).with_fallback(fallback)));
        self
    }

    /// 执行部署
    pub async fn deploy(self) -> Result<Deployment, InfrastructureError> {
        info!("开始部署容器");

        let mut config_manager = ConfigManager::new();
        for provider in self.config_sources {
            config_manager.register_provider(provider).await;
        }

        match self.logging {
            LoggingMode::Disabled => {}
            LoggingMode::FromConfig => {
                let logging: LoggingConfig = config_manager.bind_section().await?;
                init_logging(&logging)?;
            }
            LoggingMode::Explicit(logging) => {
                init_logging(&logging)?;
            }
        }

        let container_config = match self.container_config {
            Some(config) => config,
            None => config_manager.bind_section::<ContainerConfig>().await?,
        };
        debug!("容器配置: {:?}", container_config);

        let bean_manager = StandardBeanManager::new(container_config);
        for scanner in self.scanners {
            bean_manager.add_scanner(scanner);
        }
        for extension in self.extensions {
            bean_manager.add_extension(extension);
        }
        for class in self.beans {
            bean_manager.register_bean(class);
        }
        if let Err(e) = bean_manager.init().await {
            error!("容器部署失败: {}", e);
            bean_manager.destroy();
            return Err(e.into());
        }

        let caches_config: CachesConfig = config_manager.bind_section().await?;
        let cache_manager = Arc::new(CacheManager::new());
        for registration in &self.caches {
            let config = caches_config
                .caches
                .get(registration.name())
                .cloned()
                .unwrap_or_default();
            if let Err(e) = registration.create(&cache_manager, &config).await {
                error!("创建缓存 {} 失败: {}", registration.name(), e);
                cache_manager.close();
                bean_manager.destroy();
                return Err(e.into());
            }
        }
        for name in caches_config.caches.keys() {
            if !self.caches.iter().any(|r| r.name() == name) {
                warn!("配置中的缓存 {} 没有注册键值类型，已跳过", name);
            }
        }

        info!(
            "容器部署完成，Bean {} 个，缓存 {} 个",
            bean_manager.beans().len(),
            cache_manager.cache_names().len()
        );
        Ok(Deployment::new(Arc::new(config_manager), bean_manager, cache_manager))
    }
}

impl Default for ContainerBootstrapper {
    fn default() -> Self {
        Self::new()
    }
}
