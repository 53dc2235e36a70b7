//! 配置提供者实现

use crate::tree::ConfigTree;
use async_trait::async_trait;
use config_abstractions::{ordinal, ConfigProvider};
use infrastructure_common::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 读取配置文件，可选文件不存在时返回 `None`
fn read_config_file(path: &Path, optional: bool) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        if optional {
            debug!("可选配置文件不存在，跳过: {}", path.display());
            return Ok(None);
        }
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(Some(std::fs::read_to_string(path)?))
}

fn lookup(tree: &ConfigTree, key: &str) -> Result<Value, ConfigError> {
    tree.get(key).cloned().ok_or_else(|| ConfigError::KeyNotFound {
        key: key.to_string(),
    })
}

/// TOML 配置提供者
#[derive(Debug)]
pub struct TomlConfigProvider {
    name: String,
    file_path: PathBuf,
    optional: bool,
    tree: ConfigTree,
    priority: i32,
}

impl TomlConfigProvider {
    /// 创建新的 TOML 配置提供者，文件必须存在
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::open(path.as_ref(), false)
    }

    /// 创建文件可以不存在的 TOML 配置提供者
    pub fn optional<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::open(path.as_ref(), true)
    }

    fn open(path: &Path, optional: bool) -> Result<Self, ConfigError> {
        let mut provider = Self {
            name: format!("toml:{}", path.display()),
            file_path: path.to_path_buf(),
            optional,
            tree: ConfigTree::new(),
            priority: ordinal::FILE,
        };
        provider.load_config()?;
        Ok(provider)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load_config(&mut self) -> Result<(), ConfigError> {
        debug!("加载 TOML 配置文件: {}", self.file_path.display());
        self.tree = match read_config_file(&self.file_path, self.optional)? {
            Some(content) => {
                let table: toml::Table = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    source: Box::new(e),
                })?;
                ConfigTree::from_toml(table)
            }
            None => ConfigTree::new(),
        };
        debug!("TOML 配置文件加载完成，共 {} 个键", self.tree.keys().len());
        Ok(())
    }
}

#[async_trait]
impl ConfigProvider for TomlConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.tree, key)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_config()
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.tree.keys())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// JSON 配置提供者
#[derive(Debug)]
pub struct JsonConfigProvider {
    name: String,
    file_path: PathBuf,
    optional: bool,
    tree: ConfigTree,
    priority: i32,
}

impl JsonConfigProvider {
    /// 创建新的 JSON 配置提供者，文件必须存在
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::open(path.as_ref(), false)
    }

    /// 创建文件可以不存在的 JSON 配置提供者
    pub fn optional<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::open(path.as_ref(), true)
    }

    fn open(path: &Path, optional: bool) -> Result<Self, ConfigError> {
        let mut provider = Self {
            name: format!("json:{}", path.display()),
            file_path: path.to_path_buf(),
            optional,
            tree: ConfigTree::new(),
            priority: ordinal::FILE,
        };
        provider.load_config()?;
        Ok(provider)
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load_config(&mut self) -> Result<(), ConfigError> {
        debug!("加载 JSON 配置文件: {}", self.file_path.display());
        self.tree = match read_config_file(&self.file_path, self.optional)? {
            Some(content) => match serde_json::from_str::<Value>(&content)? {
                root @ Value::Object(_) => ConfigTree::from_value(root),
                _ => {
                    return Err(ConfigError::ValidationError {
                        message: format!("JSON 配置 {} 的根节点必须是对象", self.file_path.display()),
                    })
                }
            },
            None => ConfigTree::new(),
        };
        debug!("JSON 配置文件加载完成，共 {} 个键", self.tree.keys().len());
        Ok(())
    }
}

#[async_trait]
impl ConfigProvider for JsonConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.tree, key)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_config()
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.tree.keys())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量配置提供者
///
/// `APP__CACHES__ORDERS__TTL_SECS=30` 在前缀为 `APP` 时映射为 `caches.orders.ttl_secs`。
/// 值依次尝试解析为布尔值、整数、浮点数，都失败时保留为字符串。
#[derive(Debug)]
pub struct EnvironmentConfigProvider {
    name: String,
    prefix: String,
    separator: String,
    priority: i32,
    tree: ConfigTree,
}

impl EnvironmentConfigProvider {
    /// 创建新的环境变量配置提供者并读取当前进程的环境变量
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// 使用给定的变量代替进程环境变量
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let prefix = prefix.into();
        let mut provider = Self {
            name: format!("env:{}", prefix),
            prefix,
            separator: "__".to_string(),
            priority: ordinal::ENVIRONMENT,
            tree: ConfigTree::new(),
        };
        provider.load_env_vars(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        provider
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 环境变量前缀
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn load_env_vars(&mut self, vars: impl Iterator<Item = (String, String)>) {
        debug!("加载环境变量，前缀: {}", self.prefix);
        let mut tree = ConfigTree::new();
        let mut count = 0;
        for (key, value) in vars {
            if let Some(config_key) = self.env_key_to_config_key(&key) {
                tree.insert(&config_key, parse_env_value(&value));
                count += 1;
            }
        }
        self.tree = tree;
        debug!("加载了 {} 个环境变量", count);
    }

    /// 将环境变量键转换为配置键，前缀不匹配时返回 `None`
    fn env_key_to_config_key(&self, env_key: &str) -> Option<String> {
        let rest = env_key
            .strip_prefix(&self.prefix)?
            .strip_prefix(&self.separator)?;
        if rest.is_empty() {
            return None;
        }
        Some(
            rest.split(&self.separator)
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join("."),
        )
    }
}

fn parse_env_value(value: &str) -> Value {
    if let Ok(bool_val) = value.parse::<bool>() {
        Value::Bool(bool_val)
    } else if let Ok(int_val) = value.parse::<i64>() {
        Value::from(int_val)
    } else if let Some(number) = value.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Value::Number(number)
    } else {
        Value::String(value.to_string())
    }
}

#[async_trait]
impl ConfigProvider for EnvironmentConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.tree, key)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_env_vars(std::env::vars());
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.tree.keys())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 内存配置提供者，通常用于提供默认值
#[derive(Debug, Clone)]
pub struct InMemoryConfigProvider {
    name: String,
    tree: ConfigTree,
    priority: i32,
}

impl InMemoryConfigProvider {
    /// 创建空的内存配置提供者
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree: ConfigTree::new(),
            priority: ordinal::DEFAULTS,
        }
    }

    /// 设置一个值
    pub fn with_value(mut self, key: &str, value: Value) -> Self {
        self.tree.insert(key, value);
        self
    }

    /// 使用整棵 JSON 对象
    pub fn with_tree(mut self, value: Value) -> Self {
        self.tree = ConfigTree::from_value(value);
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ConfigProvider for InMemoryConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.tree, key)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.tree.keys())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_environment_keys_are_mapped_to_paths() {
        let provider = EnvironmentConfigProvider::from_vars(
            "APP",
            [
                ("APP__CONTAINER__MAX_RESOLUTION_DEPTH", "12"),
                ("APP__LOGGING__JSON", "true"),
                ("APP__LOGGING__LEVEL", "debug"),
                ("APP__RATIO", "0.5"),
                ("APPLICATION__IGNORED", "1"),
                ("OTHER__IGNORED", "1"),
            ],
        );

        assert_eq!(
            provider.get_configuration("container.max_resolution_depth").await.unwrap(),
            json!(12)
        );
        assert_eq!(provider.get_configuration("logging.json").await.unwrap(), json!(true));
        assert_eq!(provider.get_configuration("ratio").await.unwrap(), json!(0.5));

        let logging = provider.get_section("logging").await.unwrap();
        assert_eq!(logging.get("level"), Some(&json!("debug")));
        assert_eq!(provider.get_all_keys().await.unwrap().len(), 4);
        assert_eq!(provider.priority(), ordinal::ENVIRONMENT);
    }

    #[tokio::test]
    async fn test_in_memory_provider() {
        let provider = InMemoryConfigProvider::new("defaults")
            .with_value("logging.level", json!("info"))
            .with_priority(5);

        assert_eq!(provider.get_configuration("logging.level").await.unwrap(), json!("info"));
        assert!(matches!(
            provider.get_configuration("logging.json").await,
            Err(ConfigError::KeyNotFound { .. })
        ));
        assert_eq!(provider.priority(), 5);
        assert_eq!(provider.name(), "defaults");
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value("false"), json!(false));
        assert_eq!(parse_env_value("-3"), json!(-3));
        assert_eq!(parse_env_value("memory"), json!("memory"));
    }
}
