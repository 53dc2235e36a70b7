//! 文件系统条目存储
//!
//! 每个键一个 JSON 文件，文件名为键文本的 SHA-256 摘要，长度固定。文件中同时保存键，
//! 用于枚举键和排除摘要冲突。

use async_trait::async_trait;
use caching_abstractions::{CacheKey, CacheValue, EntryStore, ExpirableEntry};
use infrastructure_common::CacheError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const ENTRY_EXTENSION: &str = "json";

#[derive(Serialize, Deserialize)]
struct StoredEntry<K, V> {
    key: K,
    entry: ExpirableEntry<V>,
}

/// 文件系统条目存储
#[derive(Debug)]
pub struct FileSystemEntryStore<K, V> {
    name: String,
    directory: PathBuf,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: CacheKey, V: CacheValue> FileSystemEntryStore<K, V> {
    /// 打开存储，目录不存在时创建
    pub async fn open(name: impl Into<String>, directory: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let name = name.into();
        let directory = directory.into();
        fs::create_dir_all(&directory).await?;
        info!("打开文件系统缓存存储 {}: {}", name, directory.display());
        Ok(Self {
            name,
            directory,
            _marker: PhantomData,
        })
    }

    /// 存储目录
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &K) -> PathBuf {
        let digest = Sha256::digest(key.to_string().as_bytes());
        self.directory
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION))
    }

    async fn read_stored(&self, path: &Path) -> Result<Option<StoredEntry<K, V>>, CacheError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut files = Vec::new();
        let mut dir = fs::read_dir(&self.directory).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl<K: CacheKey, V: CacheValue> EntryStore<K, V> for FileSystemEntryStore<K, V> {
    async fn contains_entry(&self, key: &K) -> Result<bool, CacheError> {
        Ok(self.get_entry(key).await?.is_some())
    }

    async fn get_entry(&self, key: &K) -> Result<Option<ExpirableEntry<V>>, CacheError> {
        let stored = self.read_stored(&self.path_for(key)).await?;
        Ok(stored.filter(|s| s.key == *key).map(|s| s.entry))
    }

    async fn put_entry(&self, key: &K, entry: ExpirableEntry<V>) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(&StoredEntry {
            key: key.clone(),
            entry,
        })?;

        // 先写临时文件再改名，读取方不会看到写了一半的条目；临时文件名每次写入不同
        let temp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&temp, bytes).await?;
        fs::rename(&temp, &path).await?;
        debug!("写入缓存文件: {}", path.display());
        Ok(())
    }

    async fn remove_entry(&self, key: &K) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        if self.get_entry(key).await?.is_none() {
            return Ok(false);
        }
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let files = self.entry_files().await?;
        let count = files.len();
        for path in files {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!("清空文件系统缓存存储 {}，删除 {} 个文件", self.name, count);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<K>, CacheError> {
        let mut keys = Vec::new();
        for path in self.entry_files().await? {
            match self.read_stored(&path).await {
                Ok(Some(stored)) => keys.push(stored.key),
                Ok(None) => {}
                Err(e) => warn!("跳过无法读取的缓存文件 {}: {}", path.display(), e),
            }
        }
        Ok(keys)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
