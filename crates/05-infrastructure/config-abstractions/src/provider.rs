//! 配置提供者抽象接口

use async_trait::async_trait;
use infrastructure_common::{ConfigError, ConfigSection};
use serde_json::Value;

/// 内置提供者的默认优先级，数值越大越优先
pub mod ordinal {
    /// 环境变量
    pub const ENVIRONMENT: i32 = 300;
    /// 配置文件
    pub const FILE: i32 = 100;
    /// 代码中给出的默认值
    pub const DEFAULTS: i32 = 0;
}

/// 配置提供者 trait
///
/// 定义从不同数据源获取配置的统一接口。配置键使用 `.` 分隔的路径，
/// 例如 `caches.orders.ttl_secs`。
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// 获取配置值，键不存在时返回 [`ConfigError::KeyNotFound`]
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError>;

    /// 获取配置节
    async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError> {
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

    /// 重新加载配置
    async fn reload(&mut self) -> Result<(), ConfigError>;

    /// 检查配置键是否存在
    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        match self.get_configuration(key).await {
            Ok(_) => Ok(true),
            Err(ConfigError::KeyNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 获取所有叶子配置键
    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError>;

    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 获取提供者优先级
    fn priority(&self) -> i32 {
        ordinal::DEFAULTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 只有一个值的提供者
    struct Single(Value);

    #[async_trait]
    impl ConfigProvider for Single {
        async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
            if key == "container" {
                Ok(self.0.clone())
            } else {
                Err(ConfigError::KeyNotFound {
                    key: key.to_string(),
                })
            }
        }

        async fn reload(&mut self) -> Result<(), ConfigError> {
            Ok(())
        }

        async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
            Ok(vec!["container".to_string()])
        }

        fn name(&self) -> &str {
            "single"
        }
    }

    #[tokio::test]
    async fn test_default_section_and_contains_key() {
        let provider = Single(json!({ "max_resolution_depth": 4 }));
        let section = provider.get_section("container").await.unwrap();
        assert_eq!(section.get("max_resolution_depth"), Some(&json!(4)));

        assert!(provider.contains_key("container").await.unwrap());
        assert!(!provider.contains_key("logging").await.unwrap());
        assert_eq!(provider.priority(), ordinal::DEFAULTS);
    }

    #[tokio::test]
    async fn test_scalar_is_not_a_section() {
        let provider = Single(json!(3));
        assert!(matches!(
            provider.get_section("container").await,
            Err(ConfigError::TypeConversionError { .. })
        ));
    }
}
