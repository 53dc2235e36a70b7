//! 配置管理器实现

use crate::tree::merge_missing;
use config_abstractions::ConfigProvider;
use infrastructure_common::{ConfigError, ConfigOptions, ConfigSection};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 配置管理器
///
/// 协调多个配置提供者并提供统一的配置访问接口。优先级高的提供者覆盖优先级低的
/// 提供者；同一路径在多个提供者中都是表时按键深度合并。优先级相同时先注册的优先。
pub struct ConfigManager {
    /// 配置提供者列表（按优先级排序）
    providers: Vec<Box<dyn ConfigProvider>>,
    /// 缓存的配置值
    config_cache: RwLock<HashMap<String, Value>>,
    /// 是否启用缓存
    cache_enabled: bool,
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("providers", &self.provider_names())
            .field("cache_enabled", &self.cache_enabled)
            .finish()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            config_cache: RwLock::new(HashMap::new()),
            cache_enabled: true,
        }
    }

    /// 设置是否启用缓存
    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
        self.config_cache.get_mut().clear();
    }

    /// 清除配置缓存
    pub async fn clear_cache(&self) {
        self.config_cache.write().await.clear();
        debug!("配置缓存已清除");
    }

    /// 注册配置提供者
    pub async fn register_provider(&mut self, provider: Box<dyn ConfigProvider>) {
        info!(
            "注册配置提供者: {} (优先级 {})",
            provider.name(),
            provider.priority()
        );
        self.providers.push(provider);
        // 稳定排序，优先级相同时保持注册顺序
        self.providers.sort_by(|a, b| b.priority().cmp(&a.priority()));
        self.clear_cache().await;
    }

    /// 移除配置提供者
    pub async fn unregister_provider(&mut self, provider_name: &str) -> Result<(), ConfigError> {
        let initial_count = self.providers.len();
        self.providers.retain(|p| p.name() != provider_name);

        if self.providers.len() < initial_count {
            info!("移除配置提供者: {}", provider_name);
            self.clear_cache().await;
            Ok(())
        } else {
            warn!("配置提供者不存在: {}", provider_name);
            Err(ConfigError::KeyNotFound {
                key: provider_name.to_string(),
            })
        }
    }

    /// 按优先级排列的提供者名称
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// 获取配置提供者数量
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// 获取合并后的配置值
    pub async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        if self.cache_enabled {
            if let Some(value) = self.config_cache.read().await.get(key) {
                debug!("从缓存获取配置: {}", key);
                return Ok(value.clone());
            }
        }

        let mut merged: Option<Value> = None;
        for provider in &self.providers {
            match provider.get_configuration(key).await {
                Ok(value) => {
                    debug!("从提供者 {} 获取配置: {}", provider.name(), key);
                    match merged.as_mut() {
                        Some(existing) => merge_missing(existing, value),
                        None => merged = Some(value),
                    }
                    // 标量值不再与低优先级的值合并
                    if merged.as_ref().is_some_and(|v| !v.is_object()) {
                        break;
                    }
                }
                Err(ConfigError::KeyNotFound { .. }) => continue,
                Err(e) => {
                    error!("提供者 {} 获取配置失败: {}", provider.name(), e);
                    continue;
                }
            }
        }

        let value = merged.ok_or_else(|| ConfigError::KeyNotFound {
            key: key.to_string(),
        })?;
        if self.cache_enabled {
            self.config_cache
                .write()
                .await
                .insert(key.to_string(), value.clone());
        }
        Ok(value)
    }

    /// 获取配置节
    pub async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError> {
        match self.get_configuration(section_name).await? {
            Value::Object(map) => {
                let mut section = ConfigSection::new();
                for (key, value) in map {
                    section.insert(key, value);
                }
                Ok(section)
            }
            _ => Err(ConfigError::TypeConversionError {
                key: section_name.to_string(),
                message: "配置节不是表类型".to_string(),
            }),
        }
    }

    /// 获取并转换配置值
    pub async fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get_configuration(key).await?;
        serde_json::from_value(value).map_err(|e| ConfigError::TypeConversionError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 获取并转换配置值，键不存在时返回 `None`
    pub async fn get_optional_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get_value(key).await {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::KeyNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 把某个路径绑定到类型，路径不存在时使用默认值
    pub async fn bind<T>(&self, path: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        debug!("绑定配置到类型: {} -> {}", path, std::any::type_name::<T>());
        Ok(self.get_optional_value(path).await?.unwrap_or_default())
    }

    /// 绑定强类型配置节
    pub async fn bind_section<T: ConfigOptions>(&self) -> Result<T, ConfigError> {
        self.bind(T::section_path()).await
    }

    /// 任一提供者中是否存在该键
    pub async fn contains_key(&self, key: &str) -> bool {
        for provider in &self.providers {
            if matches!(provider.contains_key(key).await, Ok(true)) {
                return true;
            }
        }
        false
    }

    /// 全部提供者的叶子键，去重并排序
    pub async fn get_all_keys(&self) -> Vec<String> {
        let mut keys = BTreeSet::new();
        for provider in &self.providers {
            match provider.get_all_keys().await {
                Ok(provider_keys) => keys.extend(provider_keys),
                Err(e) => warn!("提供者 {} 列举配置键失败: {}", provider.name(), e),
            }
        }
        keys.into_iter().collect()
    }

    /// 重新加载所有提供者，返回第一个失败
    pub async fn reload_all(&mut self) -> Result<(), ConfigError> {
        info!("重新加载所有配置");

        let mut first_error = None;
        for provider in &mut self.providers {
            if let Err(e) = provider.reload().await {
                error!("提供者 {} 重载失败: {}", provider.name(), e);
                first_error.get_or_insert(e);
            }
        }
        self.clear_cache().await;

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("所有配置提供者重载成功");
                Ok(())
            }
        }
    }
}
