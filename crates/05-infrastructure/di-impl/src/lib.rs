//! # 依赖注入具体实现
//!
//! 提供标准 Bean 管理器、作用域上下文、注入目标和部署校验。
//!
//! ```no_run
//! use di_abstractions::{BeanClass, ContainerConfig};
//! use di_impl::StandardBeanManager;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! #[derive(Default)]
//! struct Clock;
//!
//! let manager = StandardBeanManager::new(ContainerConfig::default());
//! manager.register_bean(BeanClass::builder::<Clock>().default_constructor().build());
//! manager.init().await?;
//! let _clock = manager.get_reference::<Clock>()?;
//! manager.destroy();
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod injection_target;
pub mod manager;
pub mod registry;
pub mod scanner;
pub mod validation;

pub use context::ScopeContext;
pub use injection_target::DefaultInjectionTarget;
pub use manager::StandardBeanManager;
pub use registry::{BeanRegistry, RegisteredBean};
pub use scanner::StaticArchiveScanner;
pub use validation::{validate_deployment, DependencyGraph};
