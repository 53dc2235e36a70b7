//! 错误类型定义

use thiserror::Error;

/// 装箱的动态错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {key}, 原因: {message}")]
    TypeConversionError { key: String, message: String },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// Bean 定义错误
///
/// 在发现阶段收集，发现结束后统一报告
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Bean 重复注册: {type_name}")]
    DuplicateBean { type_name: String },

    #[error("依赖不满足: {injection_point}, 需要类型 {required_type}, 限定符 {qualifiers}")]
    UnsatisfiedDependency {
        injection_point: String,
        required_type: String,
        qualifiers: String,
    },

    #[error("依赖存在歧义: {injection_point}, 需要类型 {required_type}, 候选 Bean: {candidates:?}")]
    AmbiguousDependency {
        injection_point: String,
        required_type: String,
        candidates: Vec<String>,
    },

    #[error("Bean 声明无效: {type_name}, 原因: {message}")]
    MalformedDeclaration { type_name: String, message: String },

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("扩展 {extension} 报告错误: {message}")]
    Extension { extension: String, message: String },

    #[error("Bean 归档描述符无效: {location}, 原因: {message}")]
    InvalidDescriptor { location: String, message: String },

    #[error("作用域依赖非法: {bean} ({bean_scope}) 不能注入 {dependency} ({dependency_scope})")]
    IllegalScopeDependency {
        bean: String,
        bean_scope: String,
        dependency: String,
        dependency_scope: String,
    },

    #[error("部署校验问题: {message}")]
    DeploymentProblem { message: String },
}

/// 依赖解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("没有满足条件的 Bean: 类型 {required_type}, 限定符 {qualifiers}")]
    Unsatisfied {
        required_type: String,
        qualifiers: String,
    },

    #[error("存在多个满足条件的 Bean: 类型 {required_type}, 限定符 {qualifiers}, 候选: {candidates:?}")]
    Ambiguous {
        required_type: String,
        qualifiers: String,
        candidates: Vec<String>,
    },
}

/// 实例创建错误
///
/// 仅影响单次查找或创建调用，不会破坏注册表状态
#[derive(Error, Debug)]
pub enum CreationError {
    #[error("创建 {bean} 时解析依赖 {injection_point} 失败: {source}")]
    Resolution {
        bean: String,
        injection_point: String,
        #[source]
        source: ResolutionError,
    },

    #[error("构造 {bean} 失败: {source}")]
    ConstructorFailed { bean: String, source: BoxError },

    #[error("注入 {bean}.{member} 失败: {source}")]
    InjectionFailed {
        bean: String,
        member: String,
        source: BoxError,
    },

    #[error("执行 {bean}.{method} 生命周期回调失败: {source}")]
    LifecycleCallbackFailed {
        bean: String,
        method: String,
        source: BoxError,
    },

    #[error("实例类型不匹配: {bean} 无法转换为 {expected}")]
    TypeMismatch { bean: String, expected: String },

    #[error("创建过程中出现循环依赖: {chain}")]
    CircularCreation { chain: String },

    #[error("解析深度超过上限 {max_depth}")]
    MaxDepthExceeded { max_depth: usize },

    #[error("作用域 {scope} 的上下文未激活")]
    ContextNotActive { scope: String },

    #[error("容器状态无效: {message}")]
    InvalidState { message: String },
}

impl CreationError {
    /// 若错误由依赖解析失败引起，返回对应的解析错误
    pub fn resolution_error(&self) -> Option<&ResolutionError> {
        match self {
            Self::Resolution { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 部署错误
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("部署失败，共 {} 个定义错误: {}", .errors.len(), join_errors(.errors))]
    DefinitionErrors { errors: Vec<DefinitionError> },

    #[error("Bean 归档扫描失败: {scanner}, 原因: {message}")]
    ScanFailed { scanner: String, message: String },

    #[error("容器状态无效: 期望 {expected}, 实际 {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("关闭容器失败: {message}")]
    ShutdownFailed { message: String },
}

impl DeploymentError {
    /// 获取聚合的定义错误列表
    pub fn definition_errors(&self) -> &[DefinitionError] {
        match self {
            Self::DefinitionErrors { errors } => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(index, error)| format!("[{}] {}", index + 1, error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 事件分发错误
#[derive(Error, Debug)]
pub enum EventError {
    #[error("事件监听器 {listener} 处理失败: {source}")]
    ListenerFailed { listener: String, source: BoxError },

    #[error("事件执行器失败: {message}")]
    ExecutorFailed { message: String },

    #[error("事件被拒绝: {message}")]
    Rejected { message: String },
}

impl EventError {
    /// 创建监听器失败错误
    pub fn listener_failed(
        listener: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ListenerFailed {
            listener: listener.into(),
            source: source.into(),
        }
    }
}

/// 缓存错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("缓存后端 {backend} 操作失败: {message}")]
    Backend { backend: String, message: String },

    #[error("缓存 I/O 失败: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("缓存序列化失败: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("缓存已关闭: {cache}")]
    Closed { cache: String },

    #[error("缓存已存在: {cache}")]
    AlreadyExists { cache: String },

    #[error("缓存不存在: {cache}")]
    NotFound { cache: String },

    #[error("缓存类型不匹配: {cache}")]
    TypeMismatch { cache: String },
}

impl CacheError {
    /// 创建后端错误
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("部署错误: {source}")]
    DeploymentError {
        #[from]
        source: DeploymentError,
    },

    #[error("缓存错误: {source}")]
    CacheError {
        #[from]
        source: CacheError,
    },

    #[error("事件错误: {source}")]
    EventError {
        #[from]
        source: EventError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CreationResult<T> = Result<T, CreationError>;
pub type DeploymentResult<T> = Result<T, DeploymentError>;
pub type EventResult<T> = Result<T, EventError>;
pub type CacheResult<T> = Result<T, CacheError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_errors_are_listed_in_aggregate() {
        let error = DeploymentError::DefinitionErrors {
            errors: vec![
                DefinitionError::DuplicateBean {
                    type_name: "Alpha".to_string(),
                },
                DefinitionError::CircularDependency {
                    chain: "A -> B -> A".to_string(),
                },
            ],
        };

        let message = error.to_string();
        assert!(message.contains("2 个定义错误"));
        assert!(message.contains("[1] Bean 重复注册: Alpha"));
        assert!(message.contains("[2] 检测到循环依赖: A -> B -> A"));
        assert_eq!(error.definition_errors().len(), 2);
    }

    #[test]
    fn test_creation_error_exposes_resolution_kind() {
        let error = CreationError::Resolution {
            bean: "Greeter".to_string(),
            injection_point: "Greeter::new#0".to_string(),
            source: ResolutionError::Unsatisfied {
                required_type: "Repository".to_string(),
                qualifiers: "@Default".to_string(),
            },
        };

        assert!(matches!(
            error.resolution_error(),
            Some(ResolutionError::Unsatisfied { .. })
        ));
    }
}
