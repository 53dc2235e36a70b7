//! 以 JSON 值表示的配置树

use serde_json::{Map, Value};

/// 配置树
///
/// 所有提供者都把配置转换为同一种树形结构，按 `.` 分隔的路径访问。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map<String, Value>,
}

impl ConfigTree {
    /// 创建空的配置树
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 值创建，非对象的根视为空树
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(root) => Self { root },
            _ => Self::new(),
        }
    }

    /// 从 TOML 表创建
    pub fn from_toml(table: toml::Table) -> Self {
        Self::from_value(toml_to_json(toml::Value::Table(table)))
    }

    /// 按路径读取
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// 按路径写入，中间节点不是表时被替换
    pub fn insert(&mut self, path: &str, value: Value) {
        let parts: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for part in parents {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            current = next;
        }
        current.insert(last.to_string(), value);
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// 全部叶子路径，按字典序
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &mut keys);
        keys.sort();
        keys
    }
}

fn collect_keys(map: &Map<String, Value>, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_keys(nested, &full_key, keys),
            _ => keys.push(full_key),
        }
    }
}

/// 将 TOML 值转换为 JSON 值，日期时间转换为字符串
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

/// 把 `lower` 中 `target` 没有的键合并进来，两边都是表时递归合并
pub fn merge_missing(target: &mut Value, lower: Value) {
    if let (Value::Object(high), Value::Object(low)) = (target, lower) {
        for (key, low_value) in low {
            match high.get_mut(&key) {
                Some(high_value) => merge_missing(high_value, low_value),
                None => {
                    high.insert(key, low_value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get_nested_paths() {
        let mut tree = ConfigTree::new();
        tree.insert("caches.orders.ttl_secs", json!(30));
        tree.insert("caches.orders.store", json!("memory"));
        tree.insert("logging.level", json!("debug"));

        assert_eq!(tree.get("caches.orders.ttl_secs"), Some(&json!(30)));
        assert_eq!(tree.get("caches.orders"), Some(&json!({ "ttl_secs": 30, "store": "memory" })));
        assert_eq!(tree.get("caches.missing"), None);
        assert_eq!(tree.get("logging.level.nested"), None);
        assert_eq!(
            tree.keys(),
            vec!["caches.orders.store", "caches.orders.ttl_secs", "logging.level"]
        );
    }

    #[test]
    fn test_insert_replaces_scalar_parent() {
        let mut tree = ConfigTree::new();
        tree.insert("logging", json!("off"));
        tree.insert("logging.level", json!("info"));
        assert_eq!(tree.get("logging"), Some(&json!({ "level": "info" })));
    }

    #[test]
    fn test_merge_missing_is_deep() {
        let mut high = json!({ "orders": { "ttl_secs": 5 } });
        let low = json!({ "orders": { "ttl_secs": 60, "store": "file_system" }, "users": {} });
        merge_missing(&mut high, low);
        assert_eq!(
            high,
            json!({ "orders": { "ttl_secs": 5, "store": "file_system" }, "users": {} })
        );
    }

    #[test]
    fn test_toml_conversion() {
        let table: toml::Table = toml::from_str("a = 1\nb = [true, 1.5]\n[c]\nd = \"x\"").unwrap();
        let tree = ConfigTree::from_toml(table);
        assert_eq!(tree.get("a"), Some(&json!(1)));
        assert_eq!(tree.get("b"), Some(&json!([true, 1.5])));
        assert_eq!(tree.get("c.d"), Some(&json!("x")));
    }
}
