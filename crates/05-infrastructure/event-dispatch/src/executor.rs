//! 事件投递执行器

use infrastructure_common::{BoxError, EventError};
use tracing::{error, warn};

/// 单个监听器的投递任务
pub struct DispatchTask {
    listener: String,
    job: Box<dyn FnOnce() -> Result<(), BoxError> + Send>,
}

impl DispatchTask {
    /// 创建投递任务
    pub fn new(
        listener: impl Into<String>,
        job: impl FnOnce() -> Result<(), BoxError> + Send + 'static,
    ) -> Self {
        Self {
            listener: listener.into(),
            job: Box::new(job),
        }
    }

    /// 监听器名称
    pub fn listener(&self) -> &str {
        &self.listener
    }

    /// 执行任务
    pub fn run(self) -> Result<(), EventError> {
        let Self { listener, job } = self;
        job().map_err(|source| EventError::ListenerFailed { listener, source })
    }
}

impl std::fmt::Debug for DispatchTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTask")
            .field("listener", &self.listener)
            .finish()
    }
}

/// 投递执行器 trait
pub trait DispatchExecutor: Send + Sync {
    /// 执行一次分发产生的全部投递任务，任务已按优先级排好序
    fn execute(&self, tasks: Vec<DispatchTask>) -> Result<(), EventError>;

    /// 执行器名称
    fn name(&self) -> &str;
}

/// 顺序执行器
///
/// 在调用线程上逐个执行，第一个失败的监听器会中止后续投递
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl DispatchExecutor for SequentialExecutor {
    fn execute(&self, tasks: Vec<DispatchTask>) -> Result<(), EventError> {
        for task in tasks {
            task.run()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "sequential"
    }
}

/// 隔离执行器
///
/// 顺序执行全部任务，单个监听器失败不影响其他监听器，最后返回第一个错误
#[derive(Debug, Default, Clone, Copy)]
pub struct IsolatingExecutor;

impl DispatchExecutor for IsolatingExecutor {
    fn execute(&self, tasks: Vec<DispatchTask>) -> Result<(), EventError> {
        let mut first_error = None;

        for task in tasks {
            if let Err(e) = task.run() {
                warn!("监听器执行失败，继续投递: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "isolating"
    }
}

/// Tokio 执行器
///
/// 将每个投递任务提交到 tokio 阻塞线程池并行执行，不等待完成。
/// 监听器错误只记录日志，无法返回给分发调用方。
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    /// 使用指定运行时句柄创建执行器
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// 使用当前运行时创建执行器
    pub fn current() -> Result<Self, EventError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| EventError::ExecutorFailed {
                message: format!("当前线程没有 tokio 运行时: {}", e),
            })
    }
}

impl DispatchExecutor for TokioExecutor {
    fn execute(&self, tasks: Vec<DispatchTask>) -> Result<(), EventError> {
        for task in tasks {
            self.handle.spawn_blocking(move || {
                if let Err(e) = task.run() {
                    error!("异步投递失败: {}", e);
                }
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tokio"
    }
}
