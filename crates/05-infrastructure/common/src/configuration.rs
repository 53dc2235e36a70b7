//! 配置相关的基础接口定义

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 配置选项 trait
///
/// 可以从某个配置节绑定的强类型配置
pub trait ConfigOptions: for<'de> Deserialize<'de> + Default + Send + Sync + 'static {
    /// 配置节路径
    fn section_path() -> &'static str;
}

/// 配置节
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSection {
    /// 配置数据
    pub data: HashMap<String, serde_json::Value>,
}

impl ConfigSection {
    /// 创建新的配置节
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// 插入配置项
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// 获取配置项
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 合并另一个配置节，已存在的键保持不变
    pub fn merge_missing(&mut self, other: ConfigSection) {
        for (key, value) in other.data {
            self.data.entry(key).or_insert(value);
        }
    }

    /// 绑定到具体类型
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        serde_json::from_value(value).map_err(|e| ConfigError::SerializationError { source: e })
    }
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self::new()
    }
}
