//! 带过期时间的缓存条目与过期策略

use chrono::{DateTime, Duration as TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 带过期时间的缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirableEntry<V> {
    /// 值
    pub value: V,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 最后访问时间
    pub last_accessed: DateTime<Utc>,
    /// 过期时间，`None` 表示永不过期
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> ExpirableEntry<V> {
    /// 创建条目
    pub fn new(value: V, now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value,
            created_at: now,
            last_accessed: now,
            expires_at,
        }
    }

    /// 永不过期的条目
    pub fn eternal(value: V) -> Self {
        Self::new(value, Utc::now(), None)
    }

    /// 在指定时间是否已过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at <= now)
    }

    /// 记录访问
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
    }
}

/// 过期策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// 永不过期
    #[default]
    Eternal,
    /// 创建后经过 `ttl` 过期
    Created(Duration),
    /// 创建或访问后经过 `ttl` 过期
    Accessed(Duration),
    /// 创建或更新后经过 `ttl` 过期
    Modified(Duration),
    /// 创建、访问或更新后经过 `ttl` 过期
    Touched(Duration),
}

impl ExpiryPolicy {
    /// 新建条目的过期时间
    pub fn expiry_for_creation(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Eternal => None,
            Self::Created(ttl) | Self::Accessed(ttl) | Self::Modified(ttl) | Self::Touched(ttl) => {
                deadline(now, *ttl)
            }
        }
    }

    /// 访问后的过期时间，外层 `None` 表示保持不变
    pub fn expiry_for_access(&self, now: DateTime<Utc>) -> Option<Option<DateTime<Utc>>> {
        match self {
            Self::Accessed(ttl) | Self::Touched(ttl) => Some(deadline(now, *ttl)),
            _ => None,
        }
    }

    /// 更新后的过期时间，外层 `None` 表示保持不变
    pub fn expiry_for_update(&self, now: DateTime<Utc>) -> Option<Option<DateTime<Utc>>> {
        match self {
            Self::Modified(ttl) | Self::Touched(ttl) => Some(deadline(now, *ttl)),
            _ => None,
        }
    }
}

/// 超出时间范围的 ttl 视为永不过期
fn deadline(now: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(ttl.as_millis()).ok()?;
    now.checked_add_signed(TimeDelta::milliseconds(millis))
}
