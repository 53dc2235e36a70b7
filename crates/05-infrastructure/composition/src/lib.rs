//! # 基础设施组合层
//!
//! 负责把配置、日志、Bean 管理器和缓存组合成一个可运行的部署。
//!
//! ## 主要功能
//!
//! - **容器启动器**: [`ContainerBootstrapper`] 收集配置源、归档扫描器、扩展和缓存
//! - **日志初始化**: [`LoggingConfig`] 与 [`init_logging`]
//! - **部署**: [`Deployment`] 持有部署结果并负责关闭
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ContainerBootstrapper;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let deployment = ContainerBootstrapper::new()
//!         .add_config_toml("config/app.toml")?
//!         .add_config_env_vars("APP")
//!         .with_configured_logging()
//!         .add_cache::<String, String>("sessions")
//!         .deploy()
//!         .await?;
//!
//!     let sessions = deployment.cache::<String, String>("sessions")?;
//!     sessions.put("alice".to_string(), "token".to_string()).await?;
//!
//!     deployment.shutdown();
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod caches;
pub mod deployment;
pub mod logging;

pub use bootstrapper::ContainerBootstrapper;
pub use caches::{CacheRegistration, TypedCacheRegistration};
pub use deployment::Deployment;
pub use logging::{init_logging, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
