//! 事件分发器集成测试

use event_dispatch::{
    ConditionalEventListener, EventDispatcher, EventListener, FnEventListener,
    GenericEventListener, IsolatingExecutor, PredicateListener, TokioExecutor,
};
use infrastructure_common::{BoxError, EventError};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct OrderPlaced {
    amount: u32,
}

#[derive(Debug)]
struct OrderCancelled;

#[derive(Debug)]
struct Unrelated;

/// 记录调用顺序的监听器
struct RecordingListener {
    name: &'static str,
    priority: Option<i32>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl EventListener<OrderPlaced> for RecordingListener {
    fn on_event(&self, _event: &OrderPlaced) -> Result<(), BoxError> {
        self.log.lock().push(self.name);
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> Option<i32> {
        self.priority
    }
}

fn recording(
    name: &'static str,
    priority: Option<i32>,
    log: &Arc<Mutex<Vec<&'static str>>>,
) -> RecordingListener {
    RecordingListener {
        name,
        priority,
        log: log.clone(),
    }
}

/// 测试监听器按优先级投递
#[test]
fn test_listeners_dispatched_in_priority_order() {
    let dispatcher = EventDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    // 注册顺序与优先级顺序相反
    dispatcher.add_listener(recording("L3", None, &log));
    dispatcher.add_listener(recording("L2", Some(200), &log));
    dispatcher.add_listener(recording("L1", Some(100), &log));

    dispatcher.dispatch(OrderPlaced { amount: 1 }).unwrap();

    assert_eq!(*log.lock(), vec!["L1", "L2", "L3"]);
}

/// 测试相同优先级保持注册顺序
#[test]
fn test_equal_priority_preserves_registration_order() {
    let dispatcher = EventDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    dispatcher.add_listener(recording("first", Some(10), &log));
    dispatcher.add_listener(recording("unannotated-a", None, &log));
    dispatcher.add_listener(recording("second", Some(10), &log));
    dispatcher.add_listener(recording("unannotated-b", None, &log));
    dispatcher.add_listener(recording("third", Some(10), &log));

    dispatcher.dispatch(OrderPlaced { amount: 1 }).unwrap();

    assert_eq!(
        *log.lock(),
        vec!["first", "second", "third", "unannotated-a", "unannotated-b"]
    );
}

/// 测试每个监听器只被调用一次
#[test]
fn test_each_listener_invoked_exactly_once() {
    let dispatcher = EventDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.add_listener(recording("only", Some(1), &log));

    dispatcher.dispatch(OrderPlaced { amount: 3 }).unwrap();
    dispatcher.dispatch(OrderCancelled).unwrap();

    assert_eq!(*log.lock(), vec!["only"]);
}

/// 测试条件监听器的过滤
#[test]
fn test_conditional_listener_filters_events() {
    let dispatcher = EventDispatcher::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();

    let listener = PredicateListener::new(
        FnEventListener::new("large-orders", move |event: &OrderPlaced| {
            sink.lock().push(event.amount);
            Ok(())
        }),
        |event: &OrderPlaced| event.amount >= 100,
    );
    assert!(listener.accept(&OrderPlaced { amount: 100 }));
    dispatcher.add_conditional_listener(listener);

    dispatcher.dispatch(OrderPlaced { amount: 5 }).unwrap();
    dispatcher.dispatch(OrderPlaced { amount: 250 }).unwrap();

    assert_eq!(*received.lock(), vec![250]);
}

/// 测试失败的监听器中止后续投递
#[test]
fn test_failing_listener_aborts_delivery() {
    let dispatcher = EventDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    dispatcher.add_listener(recording("before", Some(1), &log));
    dispatcher.add_listener(
        FnEventListener::new("broken", |_: &OrderPlaced| Err("库存不足".into())).with_priority(2),
    );
    dispatcher.add_listener(recording("after", Some(3), &log));

    let result = dispatcher.dispatch(OrderPlaced { amount: 1 });

    match result {
        Err(EventError::ListenerFailed { listener, source }) => {
            assert_eq!(listener, "broken");
            assert_eq!(source.to_string(), "库存不足");
        }
        other => panic!("期望监听器失败错误，实际: {:?}", other),
    }
    assert_eq!(*log.lock(), vec!["before"]);
}

/// 测试隔离执行器继续投递并返回第一个错误
#[test]
fn test_isolating_executor_continues_after_failure() {
    let dispatcher = EventDispatcher::with_executor(Arc::new(IsolatingExecutor));
    let log = Arc::new(Mutex::new(Vec::new()));

    dispatcher.add_listener(
        FnEventListener::new("broken", |_: &OrderPlaced| Err("boom".into())).with_priority(1),
    );
    dispatcher.add_listener(recording("after", Some(2), &log));

    let result = dispatcher.dispatch(OrderPlaced { amount: 1 });

    assert!(matches!(result, Err(EventError::ListenerFailed { .. })));
    assert_eq!(*log.lock(), vec!["after"]);
}

/// 同时监听下单和取消事件的监听器
struct AuditListener {
    seen: Arc<Mutex<Vec<String>>>,
}

impl GenericEventListener for AuditListener {
    fn supported_event_types(&self) -> Vec<TypeId> {
        vec![TypeId::of::<OrderPlaced>(), TypeId::of::<OrderCancelled>()]
    }

    fn on_generic_event(&self, event: &(dyn Any + Send + Sync)) -> Result<(), BoxError> {
        if let Some(placed) = event.downcast_ref::<OrderPlaced>() {
            self.seen.lock().push(format!("placed:{}", placed.amount));
        } else if event.is::<OrderCancelled>() {
            self.seen.lock().push("cancelled".to_string());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "audit"
    }
}

/// 测试多类型监听器只接收声明的事件类型
#[test]
fn test_generic_listener_receives_declared_types_only() {
    let dispatcher = EventDispatcher::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    dispatcher.add_generic_listener(AuditListener { seen: seen.clone() });

    dispatcher.dispatch(OrderPlaced { amount: 7 }).unwrap();
    dispatcher.dispatch(Unrelated).unwrap();
    dispatcher.dispatch(OrderCancelled).unwrap();

    assert_eq!(*seen.lock(), vec!["placed:7", "cancelled"]);
}

/// 测试多类型监听器与单类型监听器共同参与优先级排序
#[test]
fn test_generic_and_typed_listeners_share_ordering() {
    let dispatcher = EventDispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    dispatcher.add_generic_listener(AuditListener { seen: seen.clone() });
    dispatcher.add_listener(recording("typed", Some(1), &log));

    assert_eq!(dispatcher.listener_names(), vec!["typed", "audit"]);
}

/// 测试 tokio 执行器异步投递
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_executor_delivers_in_background() {
    let dispatcher = EventDispatcher::with_executor(Arc::new(TokioExecutor::current().unwrap()));
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();

    dispatcher.add_listener(FnEventListener::new("async", move |event: &OrderPlaced| {
        sender.send(event.amount).map_err(|e| Box::new(e) as BoxError)
    }));

    dispatcher.dispatch(OrderPlaced { amount: 42 }).unwrap();
    assert_eq!(dispatcher.executor_name(), "tokio");

    let delivered = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .unwrap();
    assert_eq!(delivered, Some(42));
}
