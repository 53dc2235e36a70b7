//! 配置管理器集成测试

use config_abstractions::ordinal;
use config_impl::{
    ConfigManager, EnvironmentConfigProvider, InMemoryConfigProvider, JsonConfigProvider,
    TomlConfigProvider,
};
use infrastructure_common::{ConfigError, ConfigOptions};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
struct PoolOptions {
    size: u32,
    name: String,
    tags: Vec<String>,
}

impl ConfigOptions for PoolOptions {
    fn section_path() -> &'static str {
        "pool"
    }
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

async fn layered_manager(dir: &Path) -> ConfigManager {
    let toml_path = dir.join("app.toml");
    write(
        &toml_path,
        r#"
            [pool]
            size = 8
            name = "from-toml"

            [caches.orders]
            store = "file_system"
            ttl_secs = 60
        "#,
    );
    let json_path = dir.join("app.json");
    write(&json_path, r#"{ "pool": { "tags": ["json"], "size": 2 }, "feature": { "enabled": true } }"#);

    let mut manager = ConfigManager::new();
    manager
        .register_provider(Box::new(
            InMemoryConfigProvider::new("defaults")
                .with_value("pool.size", json!(1))
                .with_value("pool.name", json!("default"))
                .with_value("logging.level", json!("info")),
        ))
        .await;
    manager
        .register_provider(Box::new(TomlConfigProvider::new(&toml_path).unwrap()))
        .await;
    manager
        .register_provider(Box::new(
            JsonConfigProvider::new(&json_path)
                .unwrap()
                .with_priority(ordinal::FILE - 10),
        ))
        .await;
    manager
        .register_provider(Box::new(EnvironmentConfigProvider::from_vars(
            "APP",
            [("APP__CACHES__ORDERS__TTL_SECS", "5")],
        )))
        .await;
    manager
}

#[tokio::test]
async fn test_providers_are_ordered_by_priority() {
    let dir = tempfile::tempdir().unwrap();
    let manager = layered_manager(dir.path()).await;

    let names = manager.provider_names();
    assert_eq!(names.len(), 4);
    assert_eq!(names[0], "env:APP");
    assert!(names[1].starts_with("toml:"));
    assert!(names[2].starts_with("json:"));
    assert_eq!(names[3], "defaults");
}

#[tokio::test]
async fn test_higher_priority_wins_and_tables_merge() {
    let dir = tempfile::tempdir().unwrap();
    let manager = layered_manager(dir.path()).await;

    assert_eq!(manager.get_value::<u32>("pool.size").await.unwrap(), 8);
    assert_eq!(manager.get_value::<String>("logging.level").await.unwrap(), "info");

    let pool: PoolOptions = manager.bind_section().await.unwrap();
    assert_eq!(
        pool,
        PoolOptions {
            size: 8,
            name: "from-toml".to_string(),
            tags: vec!["json".to_string()],
        }
    );

    // 环境变量只覆盖 ttl_secs，其余键来自 TOML
    let orders = manager.get_section("caches.orders").await.unwrap();
    assert_eq!(orders.get("ttl_secs"), Some(&json!(5)));
    assert_eq!(orders.get("store"), Some(&json!("file_system")));
}

#[tokio::test]
async fn test_missing_and_mistyped_values() {
    let dir = tempfile::tempdir().unwrap();
    let manager = layered_manager(dir.path()).await;

    assert!(matches!(
        manager.get_value::<u32>("pool.missing").await,
        Err(ConfigError::KeyNotFound { .. })
    ));
    assert_eq!(manager.get_optional_value::<u32>("pool.missing").await.unwrap(), None);
    assert!(matches!(
        manager.get_value::<u32>("pool.name").await,
        Err(ConfigError::TypeConversionError { ref key, .. }) if key == "pool.name"
    ));
    assert!(matches!(
        manager.get_section("pool.size").await,
        Err(ConfigError::TypeConversionError { .. })
    ));

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Absent {
        value: u32,
    }
    let absent: Absent = manager.bind("absent").await.unwrap();
    assert_eq!(absent, Absent::default());

    assert!(manager.contains_key("feature.enabled").await);
    assert!(!manager.contains_key("feature.disabled").await);
    let keys = manager.get_all_keys().await;
    assert!(keys.contains(&"caches.orders.store".to_string()));
    assert!(keys.contains(&"pool.tags".to_string()));
}

#[tokio::test]
async fn test_reload_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reload.toml");
    write(&path, "[pool]\nsize = 1\n");

    let mut manager = ConfigManager::new();
    manager
        .register_provider(Box::new(TomlConfigProvider::new(&path).unwrap()))
        .await;
    assert_eq!(manager.get_value::<u32>("pool.size").await.unwrap(), 1);

    write(&path, "[pool]\nsize = 2\n");
    // 缓存的值在重新加载前保持不变
    assert_eq!(manager.get_value::<u32>("pool.size").await.unwrap(), 1);
    manager.reload_all().await.unwrap();
    assert_eq!(manager.get_value::<u32>("pool.size").await.unwrap(), 2);

    write(&path, "[pool\n");
    assert!(matches!(
        manager.reload_all().await,
        Err(ConfigError::ParseError { .. })
    ));
}

#[tokio::test]
async fn test_file_providers_report_missing_and_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");

    assert!(matches!(
        TomlConfigProvider::new(&missing),
        Err(ConfigError::FileNotFound { .. })
    ));
    assert!(TomlConfigProvider::optional(&missing).is_ok());
    assert!(JsonConfigProvider::optional(dir.path().join("missing.json")).is_ok());

    let scalar = dir.path().join("scalar.json");
    write(&scalar, "42");
    assert!(matches!(
        JsonConfigProvider::new(&scalar),
        Err(ConfigError::ValidationError { .. })
    ));

    let broken = dir.path().join("broken.json");
    write(&broken, "{ not json");
    assert!(matches!(
        JsonConfigProvider::new(&broken),
        Err(ConfigError::SerializationError { .. })
    ));
}

#[tokio::test]
async fn test_unregister_provider() {
    let mut manager = ConfigManager::new();
    manager
        .register_provider(Box::new(
            InMemoryConfigProvider::new("overrides")
                .with_value("pool.size", json!(3))
                .with_priority(50),
        ))
        .await;
    manager
        .register_provider(Box::new(
            InMemoryConfigProvider::new("defaults").with_value("pool.size", json!(1)),
        ))
        .await;
    assert_eq!(manager.get_value::<u32>("pool.size").await.unwrap(), 3);

    manager.unregister_provider("overrides").await.unwrap();
    assert_eq!(manager.get_value::<u32>("pool.size").await.unwrap(), 1);
    assert!(manager.unregister_provider("overrides").await.is_err());
    assert_eq!(manager.provider_count(), 1);
}
