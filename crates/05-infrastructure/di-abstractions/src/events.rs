//! 容器生命周期事件与扩展
//!
//! 生命周期事件通过 Bean 管理器的事件分发器投递给已注册的扩展。
//! 事件使用内部可变性收集扩展的修改，分发结束后由管理器读取。

use crate::annotated::{AnnotatedType, Annotation};
use crate::bean::Bean;
use crate::class::BeanClass;
use crate::observer::ObserverMethod;
use event_dispatch::GenericEventListener;
use infrastructure_common::{BoxError, DefinitionError};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// 定义错误收集器
#[derive(Debug, Clone, Default)]
pub struct ProblemCollector {
    problems: Arc<Mutex<Vec<DefinitionError>>>,
}

impl ProblemCollector {
    /// 记录定义错误
    pub fn add(&self, problem: DefinitionError) {
        warn!("记录定义错误: {}", problem);
        self.problems.lock().push(problem);
    }

    /// 当前错误快照
    pub fn snapshot(&self) -> Vec<DefinitionError> {
        self.problems.lock().clone()
    }

    /// 错误数量
    pub fn len(&self) -> usize {
        self.problems.lock().len()
    }

    /// 是否没有错误
    pub fn is_empty(&self) -> bool {
        self.problems.lock().is_empty()
    }
}

/// 类型发现开始前触发
#[derive(Debug, Default)]
pub struct BeforeBeanDiscovery {
    added: Mutex<Vec<BeanClass>>,
}

impl BeforeBeanDiscovery {
    /// 添加一个参与发现的 Bean 类
    pub fn add_annotated_type(&self, class: BeanClass) {
        self.added.lock().push(class);
    }

    /// 取出扩展添加的 Bean 类
    pub fn take_added(&self) -> Vec<BeanClass> {
        std::mem::take(&mut *self.added.lock())
    }
}

/// 每个发现的注解类型触发一次
#[derive(Debug)]
pub struct ProcessAnnotatedType {
    annotated_type: AnnotatedType,
    added_annotations: Mutex<Vec<Annotation>>,
    vetoed: AtomicBool,
}

impl ProcessAnnotatedType {
    /// 创建事件
    pub fn new(annotated_type: AnnotatedType) -> Self {
        Self {
            annotated_type,
            added_annotations: Mutex::new(Vec::new()),
            vetoed: AtomicBool::new(false),
        }
    }

    /// 被处理的注解类型
    pub fn annotated_type(&self) -> &AnnotatedType {
        &self.annotated_type
    }

    /// 将类型排除出 Bean 发现
    pub fn veto(&self) {
        self.vetoed.store(true, Ordering::SeqCst);
    }

    /// 是否已被排除
    pub fn is_vetoed(&self) -> bool {
        self.vetoed.load(Ordering::SeqCst)
    }

    /// 为类型追加注解
    pub fn add_annotation(&self, annotation: Annotation) {
        self.added_annotations.lock().push(annotation);
    }

    /// 取出追加的注解
    pub fn take_added_annotations(&self) -> Vec<Annotation> {
        std::mem::take(&mut *self.added_annotations.lock())
    }
}

/// 类型发现完成后触发
#[derive(Debug)]
pub struct AfterTypeDiscovery {
    types: Vec<AnnotatedType>,
    alternatives: Vec<String>,
    added: Mutex<Vec<BeanClass>>,
}

impl AfterTypeDiscovery {
    /// 创建事件
    pub fn new(types: Vec<AnnotatedType>, alternatives: Vec<String>) -> Self {
        Self {
            types,
            alternatives,
            added: Mutex::new(Vec::new()),
        }
    }

    /// 已发现的注解类型
    pub fn types(&self) -> &[AnnotatedType] {
        &self.types
    }

    /// 已启用的备选 Bean 名称
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// 添加一个 Bean 类，它不会再触发 [`ProcessAnnotatedType`]
    pub fn add_annotated_type(&self, class: BeanClass) {
        self.added.lock().push(class);
    }

    /// 取出扩展添加的 Bean 类
    pub fn take_added(&self) -> Vec<BeanClass> {
        std::mem::take(&mut *self.added.lock())
    }
}

/// 每个 Bean 注册后触发一次
#[derive(Debug)]
pub struct ProcessBean {
    bean: Bean,
    problems: ProblemCollector,
}

impl ProcessBean {
    /// 创建事件
    pub fn new(bean: Bean, problems: ProblemCollector) -> Self {
        Self { bean, problems }
    }

    /// 被处理的 Bean
    pub fn bean(&self) -> &Bean {
        &self.bean
    }

    /// 记录定义错误
    pub fn add_definition_error(&self, error: DefinitionError) {
        self.problems.add(error);
    }
}

/// Bean 发现完成后触发
#[derive(Debug)]
pub struct AfterBeanDiscovery {
    beans: Vec<Bean>,
    added_beans: Mutex<Vec<BeanClass>>,
    added_observers: Mutex<Vec<ObserverMethod>>,
    problems: ProblemCollector,
}

impl AfterBeanDiscovery {
    /// 创建事件
    pub fn new(beans: Vec<Bean>, problems: ProblemCollector) -> Self {
        Self {
            beans,
            added_beans: Mutex::new(Vec::new()),
            added_observers: Mutex::new(Vec::new()),
            problems,
        }
    }

    /// 已注册的 Bean
    pub fn beans(&self) -> &[Bean] {
        &self.beans
    }

    /// 添加合成 Bean
    pub fn add_bean(&self, class: BeanClass) {
        self.added_beans.lock().push(class);
    }

    /// 添加合成观察者
    pub fn add_observer_method(&self, observer: ObserverMethod) {
        self.added_observers.lock().push(observer);
    }

    /// 记录定义错误
    pub fn add_definition_error(&self, error: DefinitionError) {
        self.problems.add(error);
    }

    /// 取出添加的 Bean
    pub fn take_added_beans(&self) -> Vec<BeanClass> {
        std::mem::take(&mut *self.added_beans.lock())
    }

    /// 取出添加的观察者
    pub fn take_added_observers(&self) -> Vec<ObserverMethod> {
        std::mem::take(&mut *self.added_observers.lock())
    }
}

/// 部署校验完成后触发
#[derive(Debug)]
pub struct AfterDeploymentValidation {
    problems: ProblemCollector,
}

impl AfterDeploymentValidation {
    /// 创建事件
    pub fn new(problems: ProblemCollector) -> Self {
        Self { problems }
    }

    /// 记录部署问题，部署将失败
    pub fn add_deployment_problem(&self, message: impl Into<String>) {
        self.problems.add(DefinitionError::DeploymentProblem {
            message: message.into(),
        });
    }
}

/// 容器关闭前触发
#[derive(Debug, Default)]
pub struct BeforeShutdown;

/// 容器扩展
///
/// 每个钩子对应一个生命周期事件，返回的错误在发现阶段记录为定义错误
pub trait Extension: Send + Sync {
    /// 扩展名称
    fn name(&self) -> &str;

    /// 优先级，数值越小越先执行
    fn priority(&self) -> Option<i32> {
        None
    }

    fn before_bean_discovery(&self, _event: &BeforeBeanDiscovery) -> Result<(), BoxError> {
        Ok(())
    }

    fn process_annotated_type(&self, _event: &ProcessAnnotatedType) -> Result<(), BoxError> {
        Ok(())
    }

    fn after_type_discovery(&self, _event: &AfterTypeDiscovery) -> Result<(), BoxError> {
        Ok(())
    }

    fn process_bean(&self, _event: &ProcessBean) -> Result<(), BoxError> {
        Ok(())
    }

    fn after_bean_discovery(&self, _event: &AfterBeanDiscovery) -> Result<(), BoxError> {
        Ok(())
    }

    fn after_deployment_validation(&self, _event: &AfterDeploymentValidation) -> Result<(), BoxError> {
        Ok(())
    }

    fn before_shutdown(&self, _event: &BeforeShutdown) -> Result<(), BoxError> {
        Ok(())
    }
}

/// 将扩展适配为事件分发器的多类型监听器
pub struct ExtensionListener {
    extension: Arc<dyn Extension>,
    problems: ProblemCollector,
}

impl ExtensionListener {
    /// 创建适配器，扩展返回的错误记录到 `problems`
    pub fn new(extension: Arc<dyn Extension>, problems: ProblemCollector) -> Self {
        Self { extension, problems }
    }

    fn record(&self, phase: &str, result: Result<(), BoxError>) {
        if let Err(e) = result {
            self.problems.add(DefinitionError::Extension {
                extension: self.extension.name().to_string(),
                message: format!("{}: {}", phase, e),
            });
        }
    }
}

impl GenericEventListener for ExtensionListener {
    fn supported_event_types(&self) -> Vec<TypeId> {
        vec![
            TypeId::of::<BeforeBeanDiscovery>(),
            TypeId::of::<ProcessAnnotatedType>(),
            TypeId::of::<AfterTypeDiscovery>(),
            TypeId::of::<ProcessBean>(),
            TypeId::of::<AfterBeanDiscovery>(),
            TypeId::of::<AfterDeploymentValidation>(),
            TypeId::of::<BeforeShutdown>(),
        ]
    }

    fn on_generic_event(&self, event: &(dyn Any + Send + Sync)) -> Result<(), BoxError> {
        let extension = &self.extension;
        if let Some(event) = event.downcast_ref::<BeforeBeanDiscovery>() {
            self.record("BeforeBeanDiscovery", extension.before_bean_discovery(event));
        } else if let Some(event) = event.downcast_ref::<ProcessAnnotatedType>() {
            self.record("ProcessAnnotatedType", extension.process_annotated_type(event));
        } else if let Some(event) = event.downcast_ref::<AfterTypeDiscovery>() {
            self.record("AfterTypeDiscovery", extension.after_type_discovery(event));
        } else if let Some(event) = event.downcast_ref::<ProcessBean>() {
            self.record("ProcessBean", extension.process_bean(event));
        } else if let Some(event) = event.downcast_ref::<AfterBeanDiscovery>() {
            self.record("AfterBeanDiscovery", extension.after_bean_discovery(event));
        } else if let Some(event) = event.downcast_ref::<AfterDeploymentValidation>() {
            self.record(
                "AfterDeploymentValidation",
                extension.after_deployment_validation(event),
            );
        } else if let Some(event) = event.downcast_ref::<BeforeShutdown>() {
            // 关闭阶段不再收集定义错误
            if let Err(e) = extension.before_shutdown(event) {
                warn!("扩展 {} 处理 BeforeShutdown 失败: {}", extension.name(), e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.extension.name()
    }

    fn priority(&self) -> Option<i32> {
        self.extension.priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_dispatch::EventDispatcher;
    use infrastructure_common::TypeInfo;

    struct Strict;

    impl Extension for Strict {
        fn name(&self) -> &str {
            "strict"
        }

        fn process_annotated_type(&self, event: &ProcessAnnotatedType) -> Result<(), BoxError> {
            if event.annotated_type().type_info().is::<String>() {
                event.veto();
            }
            Ok(())
        }

        fn after_deployment_validation(&self, _event: &AfterDeploymentValidation) -> Result<(), BoxError> {
            Err("缺少必需的 Bean".into())
        }
    }

    #[test]
    fn test_extension_errors_become_definition_errors() {
        let problems = ProblemCollector::default();
        let dispatcher = EventDispatcher::new();
        dispatcher.add_generic_listener(ExtensionListener::new(Arc::new(Strict), problems.clone()));

        let event = Arc::new(ProcessAnnotatedType::new(AnnotatedType::bare(TypeInfo::of::<String>())));
        dispatcher.dispatch_shared(event.clone()).unwrap();
        assert!(event.is_vetoed());
        assert!(problems.is_empty());

        dispatcher
            .dispatch(AfterDeploymentValidation::new(problems.clone()))
            .unwrap();
        assert_eq!(
            problems.snapshot(),
            vec![DefinitionError::Extension {
                extension: "strict".to_string(),
                message: "AfterDeploymentValidation: 缺少必需的 Bean".to_string(),
            }]
        );
    }
}
