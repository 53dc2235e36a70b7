//! 标准 Bean 管理器

use crate::context::ScopeContext;
use crate::registry::{BeanRegistry, RegisteredBean};
use crate::validation::validate_deployment;
use di_abstractions::{
    format_qualifiers, AfterBeanDiscovery, AfterDeploymentValidation, AfterTypeDiscovery,
    AnnotatedType, Bean, BeanArchiveScanner, BeanClass, BeanId, BeanInstance, BeanResolver,
    BeforeBeanDiscovery, BeforeShutdown, ContainerConfig, ContainerStats, Context,
    ContextualInstance, CreationalContext, ErasedEvent, Extension, ExtensionListener,
    InjectionPoint, InjectionTarget, ManagerState, ObserverMethod, ObserverTarget,
    ProblemCollector, ProcessAnnotatedType, ProcessBean, Qualifier, Reception, ResolveContext,
};
use event_dispatch::{DispatchExecutor, DispatchTask, Event, EventDispatcher, ListenerId, SequentialExecutor};
use infrastructure_common::{
    BeanScope, BoxError, CreationError, DefinitionError, DeploymentError, EventError,
    ResolutionError, TypeInfo,
};
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 标准 Bean 管理器
///
/// 持有 Bean 注册表、观察者、应用上下文和定义错误。`init` 完成发现和校验后
/// 注册表只用于查找，克隆管理器共享同一份状态。
#[derive(Clone)]
pub struct StandardBeanManager {
    core: Arc<ManagerCore>,
}

struct ManagerCore {
    config: ContainerConfig,
    state: RwLock<ManagerState>,
    registry: RwLock<BeanRegistry>,
    annotated_types: RwLock<HashMap<TypeId, Vec<AnnotatedType>>>,
    problems: ProblemCollector,
    application_context: Arc<ScopeContext>,
    lifecycle_events: EventDispatcher,
    observer_executor: Arc<dyn DispatchExecutor>,
    scanners: Mutex<Vec<Arc<dyn BeanArchiveScanner>>>,
    extensions: Mutex<Vec<String>>,
    created_instances: AtomicU64,
    creation_failures: AtomicU64,
    fired_events: AtomicU64,
}

impl StandardBeanManager {
    /// 创建 Bean 管理器，观察者在调用线程上顺序通知
    pub fn new(config: ContainerConfig) -> Self {
        Self::with_executor(config, Arc::new(SequentialExecutor))
    }

    /// 创建使用指定观察者执行器的 Bean 管理器
    pub fn with_executor(config: ContainerConfig, observer_executor: Arc<dyn DispatchExecutor>) -> Self {
        let mut registry = BeanRegistry::default();
        registry.enable_alternatives(config.enabled_alternatives.iter().cloned());

        info!(
            "创建 Bean 管理器 (循环依赖检测: {}, 最大解析深度: {}, 观察者执行器: {})",
            config.enable_circular_dependency_detection,
            config.max_resolution_depth,
            observer_executor.name()
        );

        Self {
            core: Arc::new(ManagerCore {
                config,
                state: RwLock::new(ManagerState::Created),
                registry: RwLock::new(registry),
                annotated_types: RwLock::new(HashMap::new()),
                problems: ProblemCollector::default(),
                application_context: Arc::new(ScopeContext::new(BeanScope::Application)),
                lifecycle_events: EventDispatcher::new(),
                observer_executor,
                scanners: Mutex::new(Vec::new()),
                extensions: Mutex::new(Vec::new()),
                created_instances: AtomicU64::new(0),
                creation_failures: AtomicU64::new(0),
                fired_events: AtomicU64::new(0),
            }),
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.core.config
    }

    /// 当前状态
    pub fn state(&self) -> ManagerState {
        self.core.state()
    }

    /// 添加归档扫描器
    pub fn add_scanner(&self, scanner: Arc<dyn BeanArchiveScanner>) {
        info!("添加归档扫描器: {}", scanner.name());
        self.core.scanners.lock().push(scanner);
    }

    /// 添加扩展
    pub fn add_extension(&self, extension: Arc<dyn Extension>) -> ListenerId {
        info!("添加扩展: {}", extension.name());
        self.core.extensions.lock().push(extension.name().to_string());
        self.core
            .lifecycle_events
            .add_generic_listener(ExtensionListener::new(extension, self.core.problems.clone()))
    }

    /// 生命周期事件分发器
    pub fn lifecycle_events(&self) -> &EventDispatcher {
        &self.core.lifecycle_events
    }

    /// 注册 Bean
    ///
    /// 重复注册和声明错误记录为定义错误，返回 `None`
    pub fn register_bean(&self, class: BeanClass) -> Option<BeanId> {
        self.core.register_bean(class)
    }

    /// 注册观察者方法
    pub fn register_observer_method(&self, observer: ObserverMethod) {
        debug!("注册观察者: {} ({})", observer.name(), observer.observed());
        self.core.registry.write().register_observer(observer);
    }

    /// 记录定义错误
    pub fn add_definition_error(&self, error: DefinitionError) {
        self.core.problems.add(error);
    }

    /// 已记录的定义错误
    pub fn definition_errors(&self) -> Vec<DefinitionError> {
        self.core.problems.snapshot()
    }

    /// 获取类型 `T` 指定标识的注解类型，类型第一次被访问时创建只有类型信息的注解类型
    pub fn get_annotated_type<T: 'static>(&self, id: &str) -> Option<AnnotatedType> {
        let type_info = TypeInfo::of::<T>();
        let mut cache = self.core.annotated_types.write();
        cache
            .entry(type_info.id)
            .or_insert_with(|| vec![AnnotatedType::bare(type_info.clone())])
            .iter()
            .find(|annotated| annotated.id() == id)
            .cloned()
    }

    /// 获取类型 `T` 的全部注解类型
    pub fn get_annotated_types<T: 'static>(&self) -> Vec<AnnotatedType> {
        let type_info = TypeInfo::of::<T>();
        let mut cache = self.core.annotated_types.write();
        cache
            .entry(type_info.id)
            .or_insert_with(|| vec![AnnotatedType::bare(type_info.clone())])
            .clone()
    }

    /// 初始化：扫描归档、注册类型、按顺序触发发现事件、校验部署
    ///
    /// 发现期间的定义错误全部收集后作为一个聚合错误返回
    pub async fn init(&self) -> Result<(), DeploymentError> {
        {
            let mut state = self.core.state.write();
            if *state != ManagerState::Created {
                return Err(DeploymentError::InvalidState {
                    expected: ManagerState::Created.to_string(),
                    actual: state.to_string(),
                });
            }
            *state = ManagerState::Discovering;
        }
        info!("Bean 管理器开始初始化");

        let before = Arc::new(BeforeBeanDiscovery::default());
        self.fire_lifecycle(before.clone());
        let mut classes = before.take_added();

        let scanners = std::mem::take(&mut *self.core.scanners.lock());
        let mut alternatives = Vec::new();
        for scanner in scanners {
            debug!("执行归档扫描器: {}", scanner.name());
            let archives = match scanner.scan().await {
                Ok(archives) => archives,
                Err(e) => {
                    error!("归档扫描失败: {}", e);
                    *self.core.state.write() = ManagerState::Failed;
                    return Err(e);
                }
            };
            for archive in archives {
                for problem in archive.problems() {
                    self.core.problems.add(problem.clone());
                }
                alternatives.extend(archive.descriptor().alternatives.iter().cloned());
                let accepted = archive.accepted_candidates();
                info!(
                    "归档 {} 接受 {}/{} 个候选类",
                    archive.id(),
                    accepted.len(),
                    archive.candidates().len()
                );
                classes.extend(accepted);
            }
        }
        self.core.registry.write().enable_alternatives(alternatives);

        let mut discovered = Vec::with_capacity(classes.len());
        for class in classes {
            if class.annotated_type().is_vetoed() {
                debug!("类型已声明排除: {}", class.annotated_type());
                continue;
            }
            let event = Arc::new(ProcessAnnotatedType::new(class.annotated_type().clone()));
            self.fire_lifecycle(event.clone());
            let class = class.with_annotations(event.take_added_annotations());
            if event.is_vetoed() || class.annotated_type().is_vetoed() {
                info!("扩展排除类型: {}", class.annotated_type());
                continue;
            }
            discovered.push(class);
        }

        let after_types = Arc::new(AfterTypeDiscovery::new(
            discovered.iter().map(|c| c.annotated_type().clone()).collect(),
            self.core.registry.read().enabled_alternatives().to_vec(),
        ));
        self.fire_lifecycle(after_types.clone());
        discovered.extend(after_types.take_added());

        for class in discovered {
            self.core.register_bean(class);
        }

        for bean in self.beans() {
            self.fire_lifecycle(Arc::new(ProcessBean::new(bean, self.core.problems.clone())));
        }

        let after_beans = Arc::new(AfterBeanDiscovery::new(self.beans(), self.core.problems.clone()));
        self.fire_lifecycle(after_beans.clone());
        for class in after_beans.take_added_beans() {
            self.core.register_bean(class);
        }
        for observer in after_beans.take_added_observers() {
            self.register_observer_method(observer);
        }

        let validation_errors = validate_deployment(&self.core.registry.read(), &self.core.config);
        for problem in validation_errors {
            self.core.problems.add(problem);
        }

        self.fire_lifecycle(Arc::new(AfterDeploymentValidation::new(self.core.problems.clone())));

        let errors = self.core.problems.snapshot();
        if !errors.is_empty() {
            *self.core.state.write() = ManagerState::Failed;
            let error = DeploymentError::DefinitionErrors { errors };
            error!("{}", error);
            return Err(error);
        }

        *self.core.state.write() = ManagerState::Ready;
        info!(
            "Bean 管理器初始化完成，共 {} 个 Bean，{} 个观察者",
            self.core.registry.read().len(),
            self.core.registry.read().observer_count()
        );
        Ok(())
    }

    /// 销毁：触发 `BeforeShutdown` 并销毁应用上下文中的实例，重复调用无效果
    ///
    /// 实例的销毁顺序与创建顺序相反，不做依赖拓扑排序
    pub fn destroy(&self) {
        let previous = std::mem::replace(&mut *self.core.state.write(), ManagerState::Destroyed);
        if previous == ManagerState::Destroyed {
            return;
        }
        if previous == ManagerState::Ready {
            self.fire_lifecycle(Arc::new(BeforeShutdown));
        }
        let destroyed = self.core.application_context.destroy();
        info!("Bean 管理器已销毁，销毁 {} 个应用实例", destroyed);
    }

    /// 全部已注册的 Bean
    pub fn beans(&self) -> Vec<Bean> {
        self.core
            .registry
            .read()
            .all()
            .iter()
            .map(|r| r.bean().clone())
            .collect()
    }

    /// 匹配类型和限定符的 Bean
    pub fn get_beans<V: ?Sized + 'static>(&self, qualifiers: &[Qualifier]) -> Vec<Bean> {
        self.core
            .registry
            .read()
            .candidates(TypeId::of::<V>(), qualifiers)
            .iter()
            .map(|r| r.bean().clone())
            .collect()
    }

    /// 按名称查找 Bean
    pub fn get_beans_by_name(&self, name: &str) -> Vec<Bean> {
        self.core
            .registry
            .read()
            .by_name(name)
            .iter()
            .map(|r| r.bean().clone())
            .collect()
    }

    /// 类型安全解析
    pub fn resolve<V: ?Sized + 'static>(&self, qualifiers: &[Qualifier]) -> Result<Bean, ResolutionError> {
        self.core
            .resolve_registered(&TypeInfo::of::<V>(), qualifiers)
            .map(|r| r.bean().clone())
    }

    /// 获取 `@Default` 限定的 Bean 引用
    pub fn get_reference<V: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<V>, CreationError> {
        self.get_reference_in(&[], &[])
    }

    /// 获取带限定符的 Bean 引用
    pub fn get_qualified_reference<V: ?Sized + Send + Sync + 'static>(
        &self,
        qualifiers: &[Qualifier],
    ) -> Result<Arc<V>, CreationError> {
        self.get_reference_in(qualifiers, &[])
    }

    /// 在调用方提供的请求或会话上下文中获取 Bean 引用
    ///
    /// 依赖作用域的实例归调用方所有，不会被容器销毁
    pub fn get_reference_in<V: ?Sized + Send + Sync + 'static>(
        &self,
        qualifiers: &[Qualifier],
        contexts: &[Arc<dyn Context>],
    ) -> Result<Arc<V>, CreationError> {
        self.core.ensure_ready()?;
        let required = TypeInfo::of::<V>();
        let registered = self
            .core
            .resolve_registered(&required, qualifiers)
            .map_err(|source| CreationError::Resolution {
                bean: "BeanManager".to_string(),
                injection_point: format!("{} {}", format_qualifiers(qualifiers), required),
                source,
            })?;
        self.reference_of(&registered, &required, contexts)
    }

    /// 按名称获取 Bean 引用
    pub fn get_reference_by_name<V: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        contexts: &[Arc<dyn Context>],
    ) -> Result<Arc<V>, CreationError> {
        self.core.ensure_ready()?;
        let required = TypeInfo::of::<V>();
        let mut matches = self.core.registry.read().by_name(name);
        let resolution = match matches.len() {
            0 => Err(ResolutionError::Unsatisfied {
                required_type: required.to_string(),
                qualifiers: Qualifier::named(name).to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(ResolutionError::Ambiguous {
                required_type: required.to_string(),
                qualifiers: Qualifier::named(name).to_string(),
                candidates: matches.iter().map(|r| r.bean().to_string()).collect(),
            }),
        };
        let registered = resolution.map_err(|source| CreationError::Resolution {
            bean: "BeanManager".to_string(),
            injection_point: format!("{} {}", Qualifier::named(name), required),
            source,
        })?;
        self.reference_of(&registered, &required, contexts)
    }

    fn reference_of<V: ?Sized + Send + Sync + 'static>(
        &self,
        registered: &Arc<RegisteredBean>,
        required: &TypeInfo,
        contexts: &[Arc<dyn Context>],
    ) -> Result<Arc<V>, CreationError> {
        let mut ctx = creational_context(&self.core, contexts);
        let instance = self.core.contextual_instance(registered, &mut ctx)?;
        registered
            .class()
            .view(required, &instance)
            .and_then(|view| view.downcast::<V>())
            .ok_or_else(|| CreationError::TypeMismatch {
                bean: registered.bean().to_string(),
                expected: required.to_string(),
            })
    }

    /// 创建请求或会话上下文，由调用方负责销毁
    pub fn create_context(&self, scope: BeanScope) -> Result<Arc<ScopeContext>, CreationError> {
        if !scope.is_context_bound() {
            return Err(CreationError::InvalidState {
                message: format!("作用域 {} 的上下文由容器管理", scope),
            });
        }
        Ok(Arc::new(ScopeContext::new(scope)))
    }

    /// Bean 的注入目标
    pub fn injection_target(&self, bean: BeanId) -> Option<Arc<dyn InjectionTarget>> {
        let registered = self.core.registry.read().get(bean)?;
        let target: Arc<dyn InjectionTarget> = registered.injection_target();
        Some(target)
    }

    /// 触发事件
    pub fn fire_event<E: Event>(&self, event: E) -> Result<(), EventError> {
        self.fire_event_in(event, &[], &[])
    }

    /// 触发带限定符的事件
    pub fn fire_qualified_event<E: Event>(&self, event: E, qualifiers: &[Qualifier]) -> Result<(), EventError> {
        self.fire_event_in(event, qualifiers, &[])
    }

    /// 在调用方提供的上下文中触发事件
    ///
    /// 观察者按优先级通知，任一观察者失败时中止后续通知
    pub fn fire_event_in<E: Event>(
        &self,
        event: E,
        qualifiers: &[Qualifier],
        contexts: &[Arc<dyn Context>],
    ) -> Result<(), EventError> {
        let state = self.core.state();
        if state != ManagerState::Ready {
            return Err(EventError::Rejected {
                message: format!("Bean 管理器尚未就绪，当前状态: {}", state),
            });
        }

        let observers: Vec<ObserverMethod> = {
            let registry = self.core.registry.read();
            registry
                .observers_for(TypeId::of::<E>(), qualifiers)
                .into_iter()
                .filter(|observer| match observer.declaring_bean() {
                    Some(bean) => registry
                        .get(bean)
                        .map_or(false, |r| registry.is_enabled(r.bean())),
                    None => true,
                })
                .collect()
        };
        self.core.fired_events.fetch_add(1, Ordering::Relaxed);
        debug!(
            "触发事件 {} ({})，匹配 {} 个观察者",
            std::any::type_name::<E>(),
            format_qualifiers(qualifiers),
            observers.len()
        );

        let event: Arc<ErasedEvent> = Arc::new(event);
        let contexts = contexts.to_vec();
        let tasks = observers
            .into_iter()
            .map(|observer| {
                let core = self.core.clone();
                let event = event.clone();
                let contexts = contexts.clone();
                DispatchTask::new(observer.name().to_string(), move || {
                    core.notify_observer(&observer, event.as_ref(), &contexts)
                })
            })
            .collect();

        self.core.observer_executor.execute(tasks)
    }

    /// 统计信息
    pub fn stats(&self) -> ContainerStats {
        let registry = self.core.registry.read();
        ContainerStats {
            registered_beans: registry.len(),
            observer_methods: registry.observer_count(),
            definition_errors: self.core.problems.len(),
            created_instances: self.core.created_instances.load(Ordering::Relaxed),
            creation_failures: self.core.creation_failures.load(Ordering::Relaxed),
            fired_events: self.core.fired_events.load(Ordering::Relaxed),
        }
    }

    /// 已添加的扩展名称
    pub fn extension_names(&self) -> Vec<String> {
        self.core.extensions.lock().clone()
    }

    fn fire_lifecycle<E: Event>(&self, event: Arc<E>) {
        if let Err(e) = self.core.lifecycle_events.dispatch_shared(event) {
            let problem = match e {
                EventError::ListenerFailed { listener, source } => DefinitionError::Extension {
                    extension: listener,
                    message: source.to_string(),
                },
                other => DefinitionError::Extension {
                    extension: self.core.lifecycle_events.executor_name().to_string(),
                    message: other.to_string(),
                },
            };
            self.core.problems.add(problem);
        }
    }
}

impl std::fmt::Debug for StandardBeanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardBeanManager")
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

fn creational_context(core: &Arc<ManagerCore>, contexts: &[Arc<dyn Context>]) -> CreationalContext {
    let resolver: Arc<dyn BeanResolver> = core.clone();
    let resolve_context = ResolveContext::new(core.config.max_resolution_depth)
        .with_cycle_detection(core.config.enable_circular_dependency_detection);
    CreationalContext::new(resolver, resolve_context).with_contexts(contexts.to_vec())
}

impl ManagerCore {
    fn state(&self) -> ManagerState {
        *self.state.read()
    }

    fn ensure_ready(&self) -> Result<(), CreationError> {
        let state = self.state();
        if state != ManagerState::Ready {
            return Err(CreationError::InvalidState {
                message: format!("Bean 管理器尚未就绪，当前状态: {}", state),
            });
        }
        Ok(())
    }

    fn register_bean(&self, class: BeanClass) -> Option<BeanId> {
        let state = self.state();
        if !matches!(state, ManagerState::Created | ManagerState::Discovering) {
            warn!("Bean 管理器状态为 {}，忽略 Bean 注册: {}", state, class.type_info());
            return None;
        }

        let type_name = class.type_info().to_string();
        for message in class.declaration_errors() {
            self.problems.add(DefinitionError::MalformedDeclaration {
                type_name: type_name.clone(),
                message: message.clone(),
            });
        }

        let registered = match self.registry.write().register(&class) {
            Ok(registered) => registered,
            Err(problem) => {
                self.problems.add(problem);
                return None;
            }
        };
        let bean = registered.bean();
        self.cache_annotated_type(class.annotated_type().clone());

        for declaration in class.observers() {
            if declaration.options.reception == Reception::IfExists && bean.scope().is_dependent() {
                self.problems.add(DefinitionError::MalformedDeclaration {
                    type_name: type_name.clone(),
                    message: format!("依赖作用域的 Bean 不能声明 IfExists 观察者: {}", declaration.method),
                });
                continue;
            }
            let observer = ObserverMethod::for_bean(bean.id(), &type_name, declaration);
            debug!("注册观察者: {} ({})", observer.name(), observer.observed());
            self.registry.write().register_observer(observer);
        }

        info!(
            "注册 Bean: {} (作用域: {}, 限定符: {})",
            bean,
            bean.scope(),
            format_qualifiers(bean.qualifiers())
        );
        Some(bean.id())
    }

    fn cache_annotated_type(&self, annotated: AnnotatedType) {
        let mut cache = self.annotated_types.write();
        let types = cache.entry(annotated.type_info().id).or_default();
        match types.iter_mut().find(|existing| existing.id() == annotated.id()) {
            Some(existing) => *existing = annotated,
            None => types.push(annotated),
        }
    }

    fn resolve_registered(
        &self,
        required: &TypeInfo,
        qualifiers: &[Qualifier],
    ) -> Result<Arc<RegisteredBean>, ResolutionError> {
        self.registry.read().resolve(required, qualifiers)
    }

    /// 获取 Bean 的上下文实例，依赖作用域的实例记录在创建上下文中
    fn contextual_instance(
        &self,
        registered: &Arc<RegisteredBean>,
        ctx: &mut CreationalContext,
    ) -> Result<BeanInstance, CreationError> {
        let bean = registered.bean();
        match bean.scope() {
            BeanScope::Dependent => {
                let created = self.create_instance(registered, ctx)?;
                let instance = created.instance.clone();
                ctx.add_dependent(created);
                Ok(instance)
            }
            scope if scope.is_container_bound() => {
                let context = self.application_context.clone();
                context.get_or_create(bean.id(), &mut || self.create_instance(registered, ctx))
            }
            scope => {
                let context = ctx
                    .context_for(scope)
                    .ok_or_else(|| CreationError::ContextNotActive {
                        scope: scope.to_string(),
                    })?;
                context.get_or_create(bean.id(), &mut || self.create_instance(registered, ctx))
            }
        }
    }

    /// 创建新实例；失败时释放已创建的依赖实例，不影响注册表
    fn create_instance(
        &self,
        registered: &Arc<RegisteredBean>,
        ctx: &mut CreationalContext,
    ) -> Result<ContextualInstance, CreationError> {
        let bean = registered.bean();
        ctx.resolve_context_mut().push(bean.id(), bean.to_string())?;

        let mut child = ctx.child();
        let target: Arc<dyn InjectionTarget> = registered.injection_target();
        let result = build_instance(target.as_ref(), &mut child);
        ctx.resolve_context_mut().pop();

        match result {
            Ok(instance) => {
                self.created_instances.fetch_add(1, Ordering::Relaxed);
                debug!("创建实例: {} ({})", bean, bean.scope());
                Ok(ContextualInstance {
                    bean: bean.id(),
                    instance,
                    target,
                    dependents: child.take_dependents(),
                })
            }
            Err(e) => {
                child.release();
                self.creation_failures.fetch_add(1, Ordering::Relaxed);
                warn!("创建 {} 失败: {}", bean, e);
                Err(e)
            }
        }
    }

    fn notify_observer(
        self: &Arc<Self>,
        observer: &ObserverMethod,
        event: &ErasedEvent,
        contexts: &[Arc<dyn Context>],
    ) -> Result<(), BoxError> {
        let (bean, notify) = match observer.target() {
            ObserverTarget::Synthetic { notify } => return notify(event),
            ObserverTarget::Bean { bean, notify } => (*bean, notify),
        };
        let Some(registered) = self.registry.read().get(bean) else {
            return Ok(());
        };
        let scope = registered.bean().scope();

        if observer.reception() == Reception::IfExists {
            let existing = if scope.is_container_bound() {
                self.application_context.get(bean)
            } else {
                contexts
                    .iter()
                    .find(|c| c.scope() == scope && c.is_active())
                    .and_then(|c| c.get(bean))
            };
            return match existing {
                Some(instance) => notify(&instance, event),
                None => {
                    debug!("跳过观察者 {}: 实例尚不存在", observer.name());
                    Ok(())
                }
            };
        }

        let mut ctx = creational_context(self, contexts);
        let instance = self.contextual_instance(&registered, &mut ctx)?;
        let result = notify(&instance, event);
        // 为通知创建的依赖作用域实例在通知后销毁
        ctx.release();
        result
    }
}

fn build_instance(target: &dyn InjectionTarget, ctx: &mut CreationalContext) -> Result<BeanInstance, CreationError> {
    let instance = target.produce(ctx)?;
    target.inject(&instance, ctx)?;
    target.post_construct(&instance)?;
    Ok(instance)
}

impl BeanResolver for ManagerCore {
    fn resolve_injection_point(
        &self,
        point: &InjectionPoint,
        ctx: &mut CreationalContext,
    ) -> Result<BeanInstance, CreationError> {
        let registered = self
            .resolve_registered(point.required_type(), point.qualifiers())
            .map_err(|source| CreationError::Resolution {
                bean: point.declaring_type.to_string(),
                injection_point: point.to_string(),
                source,
            })?;
        let instance = self.contextual_instance(&registered, ctx)?;
        registered
            .class()
            .view(point.required_type(), &instance)
            .ok_or_else(|| CreationError::TypeMismatch {
                bean: registered.bean().to_string(),
                expected: point.required_type().to_string(),
            })
    }
}
