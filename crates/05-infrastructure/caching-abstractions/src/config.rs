//! 缓存配置

use crate::entry::ExpiryPolicy;
use infrastructure_common::ConfigOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// 条目存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// 内存存储
    #[default]
    Memory,
    /// 文件系统存储
    FileSystem,
}

/// 过期策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryKind {
    /// 永不过期
    #[default]
    Eternal,
    /// 按创建时间过期
    Created,
    /// 按访问时间过期
    Accessed,
    /// 按更新时间过期
    Modified,
    /// 按任意操作时间过期
    Touched,
}

/// 单个缓存的配置
///
/// ```toml
/// [caches.orders]
/// store = "file_system"
/// directory = "data/orders"
/// expiry = "accessed"
/// ttl_secs = 300
/// read_through = true
/// write_through = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 条目存储类型
    pub store: StoreKind,
    /// 文件系统存储目录，未设置时使用缓存名称
    pub directory: Option<PathBuf>,
    /// 过期策略
    pub expiry: ExpiryKind,
    /// 过期时间（秒）
    pub ttl_secs: u64,
    /// 未命中时从后备存储加载
    pub read_through: bool,
    /// 写入和删除同步到后备存储
    pub write_through: bool,
    /// 是否启用统计
    pub statistics_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            directory: None,
            expiry: ExpiryKind::Eternal,
            ttl_secs: 0,
            read_through: false,
            write_through: false,
            statistics_enabled: true,
        }
    }
}

impl CacheConfig {
    /// 过期策略
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        let ttl = Duration::from_secs(self.ttl_secs);
        match self.expiry {
            ExpiryKind::Eternal => ExpiryPolicy::Eternal,
            ExpiryKind::Created => ExpiryPolicy::Created(ttl),
            ExpiryKind::Accessed => ExpiryPolicy::Accessed(ttl),
            ExpiryKind::Modified => ExpiryPolicy::Modified(ttl),
            ExpiryKind::Touched => ExpiryPolicy::Touched(ttl),
        }
    }

    /// 文件系统存储目录
    pub fn directory_for(&self, cache_name: &str) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("cache").join(cache_name))
    }
}

/// 全部缓存的配置，键为缓存名称
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CachesConfig {
    /// 缓存配置
    pub caches: HashMap<String, CacheConfig>,
}

impl ConfigOptions for CachesConfig {
    fn section_path() -> &'static str {
        "caches"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_caches_section() {
        let content = r#"
            [orders]
            store = "file_system"
            directory = "data/orders"
            expiry = "accessed"
            ttl_secs = 300

            [sessions]
            read_through = true
        "#;

        let config: CachesConfig = toml::from_str(content).unwrap();
        let orders = &config.caches["orders"];
        assert_eq!(orders.store, StoreKind::FileSystem);
        assert_eq!(orders.expiry_policy(), ExpiryPolicy::Accessed(Duration::from_secs(300)));
        assert_eq!(orders.directory_for("orders"), PathBuf::from("data/orders"));

        let sessions = &config.caches["sessions"];
        assert!(sessions.read_through);
        assert!(sessions.statistics_enabled);
        assert_eq!(sessions.expiry_policy(), ExpiryPolicy::Eternal);
        assert_eq!(sessions.directory_for("sessions"), PathBuf::from("cache/sessions"));
    }

    #[test]
    fn test_json_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"write_through": true}"#).unwrap();
        assert!(config.write_through);
        assert_eq!(config.store, StoreKind::Memory);
    }
}
