//! Bean 作用域与上下文标识

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bean 作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BeanScope {
    /// 依赖作用域 - 每个注入点创建新实例，随宿主销毁
    #[default]
    Dependent,
    /// 单例 - 容器内唯一实例
    Singleton,
    /// 应用作用域 - 应用生命周期内共享实例
    Application,
    /// 请求作用域 - 在同一请求上下文内共享实例
    Request,
    /// 会话作用域 - 在同一会话上下文内共享实例
    Session,
}

impl BeanScope {
    /// 实例是否由容器级上下文持有
    pub fn is_container_bound(&self) -> bool {
        matches!(self, Self::Singleton | Self::Application)
    }

    /// 实例是否由调用方传入的显式上下文持有
    pub fn is_context_bound(&self) -> bool {
        matches!(self, Self::Request | Self::Session)
    }

    /// 是否为依赖作用域
    pub fn is_dependent(&self) -> bool {
        matches!(self, Self::Dependent)
    }
}

impl fmt::Display for BeanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dependent => "dependent",
            Self::Singleton => "singleton",
            Self::Application => "application",
            Self::Request => "request",
            Self::Session => "session",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for BeanScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dependent" => Ok(Self::Dependent),
            "singleton" => Ok(Self::Singleton),
            "application" => Ok(Self::Application),
            "request" => Ok(Self::Request),
            "session" => Ok(Self::Session),
            _ => Err(format!("未知的 Bean 作用域: {}", s)),
        }
    }
}

/// 作用域实例标识
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Scope {
    /// 创建新作用域
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// 创建根作用域
    pub fn root() -> Self {
        Self::new("root")
    }

    /// 创建子作用域
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", self.name, name.into()))
    }
}
