//! 容器配置与状态

use infrastructure_common::ConfigOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 容器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 是否启用循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 额外启用的备选 Bean 类型名称，与归档描述符中的列表合并
    pub enabled_alternatives: Vec<String>,
    /// 是否在部署时校验注入点
    pub validate_injection_points: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            max_resolution_depth: 100,
            enabled_alternatives: Vec::new(),
            validate_injection_points: true,
        }
    }
}

impl ConfigOptions for ContainerConfig {
    fn section_path() -> &'static str {
        "container"
    }
}

/// Bean 管理器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// 已创建，尚未初始化
    Created,
    /// 正在执行 Bean 发现
    Discovering,
    /// 部署成功，可以查找 Bean
    Ready,
    /// 部署失败
    Failed,
    /// 已销毁
    Destroyed,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Discovering => "discovering",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default)]
pub struct ContainerStats {
    /// 已注册 Bean 数量
    pub registered_beans: usize,
    /// 已注册观察者数量
    pub observer_methods: usize,
    /// 定义错误数量
    pub definition_errors: usize,
    /// 已创建实例数量
    pub created_instances: u64,
    /// 创建失败次数
    pub creation_failures: u64,
    /// 已触发事件数量
    pub fired_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ContainerConfig =
            serde_json::from_str(r#"{ "max_resolution_depth": 8 }"#).unwrap();
        assert_eq!(config.max_resolution_depth, 8);
        assert!(config.enable_circular_dependency_detection);
        assert!(config.validate_injection_points);
        assert_eq!(ContainerConfig::section_path(), "container");
    }
}
