//! 缓存统计

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// 缓存统计
///
/// 计数器为原子变量，可以在并发访问中累加；关闭统计后不再计数
#[derive(Debug)]
pub struct CacheStatistics {
    enabled: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    removals: AtomicU64,
    expirations: AtomicU64,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatisticsSnapshot {
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 写入次数
    pub puts: u64,
    /// 删除次数
    pub removals: u64,
    /// 过期条目数
    pub expirations: u64,
}

impl CacheStatisticsSnapshot {
    /// 读取次数
    pub fn gets(&self) -> u64 {
        self.hits + self.misses
    }

    /// 命中率
    pub fn hit_rate(&self) -> f64 {
        if self.gets() == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets() as f64
        }
    }
}

impl CacheStatistics {
    /// 创建统计
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            removals: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// 是否启用
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// 启用或关闭统计
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn increment(&self, counter: &AtomicU64) {
        if self.is_enabled() {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 记录命中
    pub fn record_hit(&self) {
        self.increment(&self.hits);
    }

    /// 记录未命中
    pub fn record_miss(&self) {
        self.increment(&self.misses);
    }

    /// 记录写入
    pub fn record_put(&self) {
        self.increment(&self.puts);
    }

    /// 记录删除
    pub fn record_removal(&self) {
        self.increment(&self.removals);
    }

    /// 记录过期
    pub fn record_expiration(&self) {
        self.increment(&self.expirations);
    }

    /// 当前快照
    pub fn snapshot(&self) -> CacheStatisticsSnapshot {
        CacheStatisticsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    /// 清零
    pub fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.puts, &self.removals, &self.expirations] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for CacheStatistics {
    fn default() -> Self {
        Self::new(true)
    }
}
