//! 事件监听器接口定义

use infrastructure_common::BoxError;
use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::marker::PhantomData;

/// 事件 trait
///
/// 任何 `Send + Sync + Debug` 的 `'static` 类型都可以作为事件分发
pub trait Event: Any + Send + Sync + Debug {}

impl<T: Any + Send + Sync + Debug> Event for T {}

/// 事件监听器 trait
pub trait EventListener<E: Event>: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &E) -> Result<(), BoxError>;

    /// 获取监听器名称
    fn name(&self) -> &str;

    /// 监听器优先级，数值越小越先执行，`None` 表示未声明
    fn priority(&self) -> Option<i32> {
        None
    }
}

/// 条件事件监听器 trait
///
/// 只有 [`accept`](ConditionalEventListener::accept) 返回 `true` 时才会收到事件
pub trait ConditionalEventListener<E: Event>: EventListener<E> {
    /// 判断是否接收该事件
    fn accept(&self, event: &E) -> bool;
}

/// 多类型事件监听器 trait
///
/// 只接收声明的事件类型
pub trait GenericEventListener: Send + Sync {
    /// 支持的事件类型
    fn supported_event_types(&self) -> Vec<TypeId>;

    /// 处理事件
    fn on_generic_event(&self, event: &(dyn Any + Send + Sync)) -> Result<(), BoxError>;

    /// 获取监听器名称
    fn name(&self) -> &str;

    /// 监听器优先级，数值越小越先执行，`None` 表示未声明
    fn priority(&self) -> Option<i32> {
        None
    }
}

/// 基于闭包的事件监听器
pub struct FnEventListener<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), BoxError> + Send + Sync,
{
    name: String,
    priority: Option<i32>,
    handler: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnEventListener<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), BoxError> + Send + Sync,
{
    /// 创建闭包监听器
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            priority: None,
            handler,
            _event: PhantomData,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

impl<E, F> EventListener<E> for FnEventListener<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), BoxError> + Send + Sync,
{
    fn on_event(&self, event: &E) -> Result<(), BoxError> {
        (self.handler)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Option<i32> {
        self.priority
    }
}

/// 为任意监听器附加过滤条件
pub struct PredicateListener<E, L, P>
where
    E: Event,
    L: EventListener<E>,
    P: Fn(&E) -> bool + Send + Sync,
{
    inner: L,
    predicate: P,
    _event: PhantomData<fn(&E)>,
}

impl<E, L, P> PredicateListener<E, L, P>
where
    E: Event,
    L: EventListener<E>,
    P: Fn(&E) -> bool + Send + Sync,
{
    /// 创建条件监听器
    pub fn new(inner: L, predicate: P) -> Self {
        Self {
            inner,
            predicate,
            _event: PhantomData,
        }
    }
}

impl<E, L, P> EventListener<E> for PredicateListener<E, L, P>
where
    E: Event,
    L: EventListener<E>,
    P: Fn(&E) -> bool + Send + Sync,
{
    fn on_event(&self, event: &E) -> Result<(), BoxError> {
        self.inner.on_event(event)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn priority(&self) -> Option<i32> {
        self.inner.priority()
    }
}

impl<E, L, P> ConditionalEventListener<E> for PredicateListener<E, L, P>
where
    E: Event,
    L: EventListener<E>,
    P: Fn(&E) -> bool + Send + Sync,
{
    fn accept(&self, event: &E) -> bool {
        (self.predicate)(event)
    }
}
