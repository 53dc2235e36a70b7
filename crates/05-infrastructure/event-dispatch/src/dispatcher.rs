//! 事件分发器实现

use crate::executor::{DispatchExecutor, DispatchTask, SequentialExecutor};
use crate::listener::{ConditionalEventListener, Event, EventListener, GenericEventListener};
use infrastructure_common::{BoxError, EventError};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

type ErasedEvent = dyn Any + Send + Sync;
type ErasedHandler = Arc<dyn Fn(&ErasedEvent) -> Result<(), BoxError> + Send + Sync>;
type ErasedFilter = Arc<dyn Fn(&ErasedEvent) -> bool + Send + Sync>;

/// 监听器注册句柄，用于移除监听器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// 监听器注册信息
#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    name: String,
    priority: Option<i32>,
    event_types: Vec<TypeId>,
    filter: Option<ErasedFilter>,
    handler: ErasedHandler,
}

impl ListenerEntry {
    /// 排序键：声明了优先级的在前，数值小的在前，同优先级按注册顺序
    fn sort_key(&self) -> (bool, i32, u64) {
        (self.priority.is_none(), self.priority.unwrap_or(0), self.id.0)
    }

    fn handles(&self, type_id: TypeId) -> bool {
        self.event_types.contains(&type_id)
    }
}

/// 事件分发器
///
/// 维护按优先级排序的监听器列表，并通过执行器投递事件
pub struct EventDispatcher {
    /// 已排序的监听器列表
    listeners: RwLock<Vec<ListenerEntry>>,
    /// 注册序号
    next_id: AtomicU64,
    /// 投递执行器
    executor: Arc<dyn DispatchExecutor>,
}

impl EventDispatcher {
    /// 创建使用顺序执行器的分发器
    pub fn new() -> Self {
        Self::with_executor(Arc::new(SequentialExecutor))
    }

    /// 创建使用指定执行器的分发器
    pub fn with_executor(executor: Arc<dyn DispatchExecutor>) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            executor,
        }
    }

    /// 注册事件监听器
    pub fn add_listener<E, L>(&self, listener: L) -> ListenerId
    where
        E: Event,
        L: EventListener<E> + 'static,
    {
        let listener = Arc::new(listener);
        let name = listener.name().to_string();
        let priority = listener.priority();

        let handler: ErasedHandler = Arc::new(move |event: &ErasedEvent| {
            match event.downcast_ref::<E>() {
                Some(event) => listener.on_event(event),
                None => Ok(()),
            }
        });

        self.insert(name, priority, vec![TypeId::of::<E>()], None, handler)
    }

    /// 注册条件事件监听器
    pub fn add_conditional_listener<E, L>(&self, listener: L) -> ListenerId
    where
        E: Event,
        L: ConditionalEventListener<E> + 'static,
    {
        let listener = Arc::new(listener);
        let name = listener.name().to_string();
        let priority = listener.priority();

        let filter_listener = listener.clone();
        let filter: ErasedFilter = Arc::new(move |event: &ErasedEvent| {
            event
                .downcast_ref::<E>()
                .map_or(false, |event| filter_listener.accept(event))
        });

        let handler: ErasedHandler = Arc::new(move |event: &ErasedEvent| {
            match event.downcast_ref::<E>() {
                Some(event) => listener.on_event(event),
                None => Ok(()),
            }
        });

        self.insert(name, priority, vec![TypeId::of::<E>()], Some(filter), handler)
    }

    /// 注册多类型事件监听器
    pub fn add_generic_listener<L>(&self, listener: L) -> ListenerId
    where
        L: GenericEventListener + 'static,
    {
        let listener = Arc::new(listener);
        let name = listener.name().to_string();
        let priority = listener.priority();
        let event_types = listener.supported_event_types();

        let handler: ErasedHandler =
            Arc::new(move |event: &ErasedEvent| listener.on_generic_event(event));

        self.insert(name, priority, event_types, None, handler)
    }

    fn insert(
        &self,
        name: String,
        priority: Option<i32>,
        event_types: Vec<TypeId>,
        filter: Option<ErasedFilter>,
        handler: ErasedHandler,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let entry = ListenerEntry {
            id,
            name,
            priority,
            event_types,
            filter,
            handler,
        };

        info!("注册事件监听器: {} (优先级: {:?})", entry.name, entry.priority);

        let mut listeners = self.listeners.write();
        let key = entry.sort_key();
        let position = listeners.partition_point(|existing| existing.sort_key() <= key);
        listeners.insert(position, entry);

        id
    }

    /// 移除事件监听器
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        let removed = listeners.len() < before;
        if removed {
            info!("移除事件监听器: {:?}", id);
        }
        removed
    }

    /// 分发事件
    pub fn dispatch<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.dispatch_shared(Arc::new(event))
    }

    /// 分发共享事件，调用方可在分发后继续读取事件状态
    pub fn dispatch_shared<E: Event>(&self, event: Arc<E>) -> Result<(), EventError> {
        let type_id = TypeId::of::<E>();

        // 先复制匹配的监听器再释放锁，监听器内部可以继续注册监听器
        let matched: Vec<ListenerEntry> = self
            .listeners
            .read()
            .iter()
            .filter(|entry| entry.handles(type_id))
            .cloned()
            .collect();

        debug!(
            "分发事件 {} 到 {} 个监听器",
            std::any::type_name::<E>(),
            matched.len()
        );

        let erased: Arc<ErasedEvent> = event;
        let tasks = matched
            .into_iter()
            .map(|entry| {
                let event = erased.clone();
                let ListenerEntry {
                    name,
                    filter,
                    handler,
                    ..
                } = entry;
                DispatchTask::new(name, move || {
                    if let Some(filter) = filter {
                        if !filter(event.as_ref()) {
                            return Ok(());
                        }
                    }
                    handler(event.as_ref())
                })
            })
            .collect();

        self.executor.execute(tasks)
    }

    /// 获取监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 获取按投递顺序排列的监听器名称
    pub fn listener_names(&self) -> Vec<String> {
        self.listeners
            .read()
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// 执行器名称
    pub fn executor_name(&self) -> &str {
        self.executor.name()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_names())
            .field("executor", &self.executor.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::FnEventListener;
    use parking_lot::Mutex;

    #[derive(Debug)]
    struct Ping;

    #[test]
    fn test_insert_keeps_priority_order() {
        let dispatcher = EventDispatcher::new();
        dispatcher.add_listener(FnEventListener::new("none", |_: &Ping| Ok(())));
        dispatcher.add_listener(FnEventListener::new("high", |_: &Ping| Ok(())).with_priority(5));
        dispatcher.add_listener(FnEventListener::new("low", |_: &Ping| Ok(())).with_priority(50));
        dispatcher.add_listener(FnEventListener::new("negative", |_: &Ping| Ok(())).with_priority(-1));

        assert_eq!(
            dispatcher.listener_names(),
            vec!["negative", "high", "low", "none"]
        );
    }

    #[test]
    fn test_remove_listener() {
        let dispatcher = EventDispatcher::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let id = dispatcher.add_listener(FnEventListener::new("count", move |_: &Ping| {
            *counter.lock() += 1;
            Ok(())
        }));

        dispatcher.dispatch(Ping).unwrap();
        assert!(dispatcher.remove_listener(id));
        assert!(!dispatcher.remove_listener(id));
        dispatcher.dispatch(Ping).unwrap();

        assert_eq!(*calls.lock(), 1);
        assert_eq!(dispatcher.listener_count(), 0);
    }
}
