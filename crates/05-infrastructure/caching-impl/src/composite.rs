//! 组合后备存储

use async_trait::async_trait;
use caching_abstractions::{CacheKey, CacheValue, FallbackStorage};
use infrastructure_common::CacheError;
use std::sync::Arc;
use tracing::{debug, warn};

/// 组合后备存储
///
/// 读取时按优先级依次尝试各后端，返回第一个非空值；后端返回 `None` 时继续尝试下一个，
/// 后端出错时记录日志后继续，所有后端都没有值时返回第一个错误。
/// 写入和删除发送到所有后端，不回滚，所有后端都尝试过后返回第一个错误。
pub struct CompositeFallbackStorage<K: CacheKey, V: CacheValue> {
    name: String,
    backends: Vec<Arc<dyn FallbackStorage<K, V>>>,
}

impl<K: CacheKey, V: CacheValue> CompositeFallbackStorage<K, V> {
    /// 创建没有后端的组合存储
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backends: Vec::new(),
        }
    }

    /// 追加后端，先追加的优先级更高
    pub fn with_backend(mut self, backend: Arc<dyn FallbackStorage<K, V>>) -> Self {
        self.backends.push(backend);
        self
    }

    /// 后端名称，按优先级排列
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// 后端数量
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// 是否没有后端
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> FallbackStorage<K, V> for CompositeFallbackStorage<K, V> {
    async fn load(&self, key: &K) -> Result<Option<V>, CacheError> {
        let mut first_error = None;

        for backend in &self.backends {
            match backend.load(key).await {
                Ok(Some(value)) => {
                    debug!("{} 从后端 {} 加载键 {}", self.name, backend.name(), key);
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{} 后端 {} 加载键 {} 失败，尝试下一个: {}", self.name, backend.name(), key, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &K, value: &V) -> Result<(), CacheError> {
        let mut first_error = None;

        for backend in &self.backends {
            if let Err(e) = backend.write(key, value).await {
                warn!("{} 写入后端 {} 失败，键 {}: {}", self.name, backend.name(), key, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn delete(&self, key: &K) -> Result<(), CacheError> {
        let mut first_error = None;

        for backend in &self.backends {
            if let Err(e) = backend.delete(key).await {
                warn!("{} 删除后端 {} 失败，键 {}: {}", self.name, backend.name(), key, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recording {
        name: String,
        value: Option<String>,
        failing: bool,
        loads: AtomicUsize,
        writes: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl Recording {
        fn new(name: &str, value: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                value: value.map(str::to_string),
                ..Self::default()
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failing: true,
                ..Self::default()
            })
        }

        fn check(&self) -> Result<(), CacheError> {
            if self.failing {
                return Err(CacheError::backend(&self.name, "不可用"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FallbackStorage<String, String> for Recording {
        async fn load(&self, _key: &String) -> Result<Option<String>, CacheError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.value.clone())
        }

        async fn write(&self, _key: &String, _value: &String) -> Result<(), CacheError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.check()
        }

        async fn delete(&self, _key: &String) -> Result<(), CacheError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.check()
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn composite(backends: &[Arc<Recording>]) -> CompositeFallbackStorage<String, String> {
        backends.iter().fold(CompositeFallbackStorage::new("composite"), |c, b| {
            c.with_backend(b.clone())
        })
    }

    #[tokio::test]
    async fn test_load_returns_first_non_empty_value() {
        let backends = [
            Recording::new("b1", None),
            Recording::new("b2", None),
            Recording::new("b3", Some("v3")),
            Recording::new("b4", Some("v4")),
        ];
        let storage = composite(&backends);

        let value = storage.load(&"k".to_string()).await.unwrap();
        assert_eq!(value.as_deref(), Some("v3"));
        let loads: Vec<usize> = backends.iter().map(|b| b.loads.load(Ordering::SeqCst)).collect();
        assert_eq!(loads, vec![1, 1, 1, 0]);
    }

    #[tokio::test]
    async fn test_load_skips_failing_backend() {
        let backends = [Recording::failing("down"), Recording::new("up", Some("v"))];
        let storage = composite(&backends);

        assert_eq!(storage.load(&"k".to_string()).await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_load_reports_error_when_nothing_found() {
        let backends = [Recording::new("empty", None), Recording::failing("down")];
        let storage = composite(&backends);

        assert!(matches!(
            storage.load(&"k".to_string()).await,
            Err(CacheError::Backend { backend, .. }) if backend == "down"
        ));
    }

    #[tokio::test]
    async fn test_write_and_delete_reach_every_backend() {
        let backends = [
            Recording::new("b1", None),
            Recording::failing("b2"),
            Recording::new("b3", None),
        ];
        let storage = composite(&backends);
        let key = "k".to_string();

        let error = storage.write(&key, &"v".to_string()).await.unwrap_err();
        assert!(matches!(error, CacheError::Backend { ref backend, .. } if backend == "b2"));
        assert!(storage.delete(&key).await.is_err());

        for backend in &backends {
            assert_eq!(backend.writes.load(Ordering::SeqCst), 1, "{}", backend.name);
            assert_eq!(backend.deletes.load(Ordering::SeqCst), 1, "{}", backend.name);
        }
    }

    #[tokio::test]
    async fn test_empty_composite() {
        let storage = CompositeFallbackStorage::<String, String>::new("empty");
        assert!(storage.is_empty());
        assert_eq!(storage.load(&"k".to_string()).await.unwrap(), None);
        storage.write(&"k".to_string(), &"v".to_string()).await.unwrap();
    }
}
