//! 日志初始化

use infrastructure_common::{ConfigOptions, InfrastructureError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 日志配置
///
/// ```toml
/// [logging]
/// level = "debug"
/// filter = "di_impl=trace,caching_impl=info"
/// json_format = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// `EnvFilter` 过滤指令，设置后代替 `level`
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl ConfigOptions for LoggingConfig {
    fn section_path() -> &'static str {
        "logging"
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 构建过滤器
    pub fn env_filter(&self) -> Result<EnvFilter, InfrastructureError> {
        let directives = self.filter.as_deref().unwrap_or(&self.level);
        EnvFilter::try_new(directives).map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志过滤指令无效: {}: {}", directives, e),
        })
    }
}

/// 初始化全局日志订阅者
///
/// 已经存在全局订阅者时不做任何事并返回 `false`，因此可以重复调用。
pub fn init_logging(config: &LoggingConfig) -> Result<bool, InfrastructureError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    let result = if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    match result {
        Ok(()) => {
            info!("日志系统初始化完成");
            Ok(true)
        }
        Err(e) => {
            debug!("日志系统已初始化，跳过: {}", e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig {
            filter: Some("di_impl=notalevel".to_string()),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(InfrastructureError::BootstrapFailed { .. })
        ));
    }

    #[test]
    fn test_repeated_initialisation_is_harmless() {
        let config = LoggingConfig::development();
        init_logging(&config).unwrap();
        assert!(!init_logging(&config).unwrap());
    }
}
