//! Bean 类描述符
//!
//! [`BeanClassBuilder`] 在注册时记录类型的注解模型，同时保存注入目标所需的
//! 构造、字段注入、初始化方法、生命周期回调、观察者回调以及 trait object 转换闭包。

use crate::annotated::{
    Annotation, AnnotatedConstructor, AnnotatedField, AnnotatedMethod, AnnotatedType, MethodKind,
    Qualifier,
};
use crate::injection::{BeanInstance, Dependency, InjectionArgs, InjectionPoint, InjectionPointKind};
use crate::observer::{BeanObserverFn, ErasedEvent, ObservedType, ObserverDeclaration, ObserverOptions};
use infrastructure_common::{BeanScope, BoxError, TypeInfo};
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 构造闭包
pub type ConstructorFn = Arc<dyn Fn(&InjectionArgs) -> Result<BeanInstance, BoxError> + Send + Sync>;

/// 成员注入闭包
pub type MemberFn = Arc<dyn Fn(&BeanInstance, &InjectionArgs) -> Result<(), BoxError> + Send + Sync>;

/// 生命周期回调闭包
pub type CallbackFn = Arc<dyn Fn(&BeanInstance) -> Result<(), BoxError> + Send + Sync>;

type ViewFn = Arc<dyn Fn(&BeanInstance) -> Option<BeanInstance> + Send + Sync>;

/// 字段或初始化方法的注入器
#[derive(Clone)]
pub struct MemberInjector {
    /// 成员名称
    pub member: String,
    /// 成员的注入点，按参数顺序排列
    pub injection_points: Vec<InjectionPoint>,
    /// 注入闭包
    pub inject: MemberFn,
}

/// 生命周期回调
#[derive(Clone)]
pub struct LifecycleCallback {
    /// 方法名称
    pub method: String,
    /// 回调闭包
    pub invoke: CallbackFn,
}

/// Bean 类
///
/// 克隆开销很小，内部数据共享
#[derive(Clone)]
pub struct BeanClass {
    inner: Arc<BeanClassInner>,
}

struct BeanClassInner {
    annotated_type: AnnotatedType,
    constructor: Option<ConstructorFn>,
    fields: Vec<MemberInjector>,
    initializers: Vec<MemberInjector>,
    post_construct: Option<LifecycleCallback>,
    pre_destroy: Option<LifecycleCallback>,
    observers: Vec<ObserverDeclaration>,
    views: Vec<(TypeId, ViewFn)>,
    declaration_errors: Vec<String>,
}

impl BeanClass {
    /// 创建类型 `T` 的构建器
    pub fn builder<T: Send + Sync + 'static>() -> BeanClassBuilder<T> {
        BeanClassBuilder::new()
    }

    /// 注解类型
    pub fn annotated_type(&self) -> &AnnotatedType {
        &self.inner.annotated_type
    }

    /// 类型信息
    pub fn type_info(&self) -> &TypeInfo {
        self.inner.annotated_type.type_info()
    }

    /// 是否声明了构造器
    pub fn has_constructor(&self) -> bool {
        self.inner.constructor.is_some()
    }

    /// 使用解析好的构造参数创建实例
    pub fn construct(&self, args: &InjectionArgs) -> Result<BeanInstance, BoxError> {
        match &self.inner.constructor {
            Some(constructor) => constructor(args),
            None => Err(format!("{} 没有声明构造器", self.type_info()).into()),
        }
    }

    /// 字段注入器
    pub fn field_injectors(&self) -> &[MemberInjector] {
        &self.inner.fields
    }

    /// 初始化方法注入器
    pub fn initializers(&self) -> &[MemberInjector] {
        &self.inner.initializers
    }

    /// 构造完成回调
    pub fn post_construct(&self) -> Option<&LifecycleCallback> {
        self.inner.post_construct.as_ref()
    }

    /// 销毁前回调
    pub fn pre_destroy(&self) -> Option<&LifecycleCallback> {
        self.inner.pre_destroy.as_ref()
    }

    /// 声明的观察者
    pub fn observers(&self) -> &[ObserverDeclaration] {
        &self.inner.observers
    }

    /// 构建时记录的声明错误
    pub fn declaration_errors(&self) -> &[String] {
        &self.inner.declaration_errors
    }

    /// 将实例转换为指定的 Bean 类型视图
    ///
    /// 目标为类型本身时返回原句柄，目标为暴露的 trait object 时执行转换闭包
    pub fn view(&self, target: &TypeInfo, instance: &BeanInstance) -> Option<BeanInstance> {
        if instance.type_info().id == target.id {
            return Some(instance.clone());
        }
        self.inner
            .views
            .iter()
            .find(|(type_id, _)| *type_id == target.id)
            .and_then(|(_, coerce)| coerce(instance))
    }

    /// 追加注解后的副本，闭包保持共享
    pub fn with_annotations(&self, extra: Vec<Annotation>) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let inner = &self.inner;
        Self {
            inner: Arc::new(BeanClassInner {
                annotated_type: inner.annotated_type.with_annotations(extra),
                constructor: inner.constructor.clone(),
                fields: inner.fields.clone(),
                initializers: inner.initializers.clone(),
                post_construct: inner.post_construct.clone(),
                pre_destroy: inner.pre_destroy.clone(),
                observers: inner.observers.clone(),
                views: inner.views.clone(),
                declaration_errors: inner.declaration_errors.clone(),
            }),
        }
    }
}

impl fmt::Debug for BeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanClass")
            .field("type", &self.inner.annotated_type.type_info().name)
            .field("id", &self.inner.annotated_type.id())
            .field("annotations", &self.inner.annotated_type.annotations())
            .field("fields", &self.inner.fields.len())
            .field("initializers", &self.inner.initializers.len())
            .field("observers", &self.inner.observers)
            .finish()
    }
}

/// Bean 类构建器
pub struct BeanClassBuilder<T> {
    id: Option<String>,
    type_info: TypeInfo,
    annotations: Vec<Annotation>,
    constructor: Option<(AnnotatedConstructor, ConstructorFn)>,
    fields: Vec<AnnotatedField>,
    field_injectors: Vec<MemberInjector>,
    methods: Vec<AnnotatedMethod>,
    initializers: Vec<MemberInjector>,
    post_construct: Option<LifecycleCallback>,
    pre_destroy: Option<LifecycleCallback>,
    observers: Vec<ObserverDeclaration>,
    exposed_types: Vec<TypeInfo>,
    views: Vec<(TypeId, ViewFn)>,
    declaration_errors: Vec<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> BeanClassBuilder<T> {
    /// 创建构建器
    pub fn new() -> Self {
        let type_info = TypeInfo::of::<T>();
        Self {
            id: None,
            exposed_types: vec![type_info.clone()],
            type_info,
            annotations: Vec::new(),
            constructor: None,
            fields: Vec::new(),
            field_injectors: Vec::new(),
            methods: Vec::new(),
            initializers: Vec::new(),
            post_construct: None,
            pre_destroy: None,
            observers: Vec::new(),
            views: Vec::new(),
            declaration_errors: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 设置注解类型标识，默认为完整类型路径
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 声明作用域
    pub fn scope(mut self, scope: BeanScope) -> Self {
        if self
            .annotations
            .iter()
            .any(|a| matches!(a, Annotation::Scope(_)))
        {
            self.declaration_errors
                .push(format!("声明了多个作用域，重复的作用域: {}", scope));
            return self;
        }
        self.annotations.push(Annotation::Scope(scope));
        self
    }

    /// 声明限定符
    pub fn qualifier(self, qualifier: Qualifier) -> Self {
        self.annotation(Annotation::Qualifier(qualifier))
    }

    /// 声明 Bean 名称
    pub fn named(self, name: impl Into<String>) -> Self {
        self.qualifier(Qualifier::named(name))
    }

    /// 声明为备选 Bean
    pub fn alternative(self) -> Self {
        self.annotation(Annotation::Alternative)
    }

    /// 声明优先级
    pub fn priority(mut self, priority: i32) -> Self {
        if self
            .annotations
            .iter()
            .any(|a| matches!(a, Annotation::Priority(_)))
        {
            self.declaration_errors
                .push(format!("声明了多个优先级，重复的优先级: {}", priority));
            return self;
        }
        self.annotations.push(Annotation::Priority(priority));
        self
    }

    /// 排除出 Bean 发现
    pub fn vetoed(self) -> Self {
        self.annotation(Annotation::Vetoed)
    }

    /// 添加任意注解
    pub fn annotation(mut self, annotation: Annotation) -> Self {
        match annotation {
            Annotation::Scope(scope) => return self.scope(scope),
            Annotation::Priority(priority) => return self.priority(priority),
            _ => {}
        }
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    /// 将类型 `V`（通常是 trait object）加入 Bean 类型集合
    pub fn exposes<V, F>(mut self, coerce: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<V> + Send + Sync + 'static,
    {
        let target = TypeInfo::of::<V>();
        if self.exposed_types.contains(&target) {
            return self;
        }
        let view: ViewFn = Arc::new(move |instance: &BeanInstance| {
            instance
                .downcast::<T>()
                .map(|value| BeanInstance::new(coerce(value)))
        });
        self.views.push((target.id, view));
        self.exposed_types.push(target);
        self
    }

    /// 声明构造器
    pub fn constructor<F>(mut self, dependencies: Vec<Dependency>, create: F) -> Self
    where
        F: Fn(&InjectionArgs) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        if self.constructor.is_some() {
            self.declaration_errors.push("声明了多个构造器".to_string());
            return self;
        }
        let parameters = dependencies
            .into_iter()
            .enumerate()
            .map(|(index, dependency)| {
                InjectionPoint::new(
                    self.type_info.clone(),
                    dependency,
                    InjectionPointKind::ConstructorParameter { index },
                )
            })
            .collect();
        let constructor: ConstructorFn = Arc::new(move |args: &InjectionArgs| -> Result<BeanInstance, BoxError> {
            let value = create(args)?;
            Ok(BeanInstance::new(Arc::new(value)))
        });
        self.constructor = Some((AnnotatedConstructor { parameters }, constructor));
        self
    }

    /// 使用 `Default` 作为无参构造器
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }

    /// 使用现成的实例，未声明作用域时为单例
    pub fn instance(mut self, instance: Arc<T>) -> Self {
        if !self
            .annotations
            .iter()
            .any(|a| matches!(a, Annotation::Scope(_)))
        {
            self.annotations.push(Annotation::Scope(BeanScope::Singleton));
        }
        if self.constructor.is_some() {
            self.declaration_errors.push("声明了多个构造器".to_string());
            return self;
        }
        let constructor: ConstructorFn =
            Arc::new(move |_: &InjectionArgs| -> Result<BeanInstance, BoxError> {
            Ok(BeanInstance::new(instance.clone()))
        });
        self.constructor = Some((AnnotatedConstructor { parameters: Vec::new() }, constructor));
        self
    }

    /// 声明字段注入，`dependency` 的类型必须为 `V`
    pub fn inject_field<V, F>(mut self, name: impl Into<String>, dependency: Dependency, set: F) -> Self
    where
        V: ?Sized + Send + Sync + 'static,
        F: Fn(&T, Arc<V>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        if !dependency.required_type.is::<V>() {
            self.declaration_errors.push(format!(
                "字段 {} 的依赖类型 {} 与注入类型 {} 不一致",
                name,
                dependency.required_type,
                TypeInfo::of::<V>()
            ));
            return self;
        }
        let point = InjectionPoint::new(
            self.type_info.clone(),
            dependency,
            InjectionPointKind::Field { name: name.clone() },
        );
        let inject: MemberFn = Arc::new(move |instance: &BeanInstance, args: &InjectionArgs| -> Result<(), BoxError> {
            let target = instance
                .downcast::<T>()
                .ok_or_else(|| format!("实例类型 {} 与 Bean 类不一致", instance.type_info()))?;
            set(&target, args.get::<V>(0)?)
        });
        self.fields.push(AnnotatedField {
            name: name.clone(),
            injection_point: point.clone(),
            annotations: vec![Annotation::Inject],
        });
        self.field_injectors.push(MemberInjector {
            member: name,
            injection_points: vec![point],
            inject,
        });
        self
    }

    /// 声明初始化方法，在字段注入之后调用
    pub fn initializer<F>(mut self, method: impl Into<String>, dependencies: Vec<Dependency>, invoke: F) -> Self
    where
        F: Fn(&T, &InjectionArgs) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let method = method.into();
        let parameters: Vec<InjectionPoint> = dependencies
            .into_iter()
            .enumerate()
            .map(|(index, dependency)| {
                InjectionPoint::new(
                    self.type_info.clone(),
                    dependency,
                    InjectionPointKind::InitializerParameter {
                        method: method.clone(),
                        index,
                    },
                )
            })
            .collect();
        let inject: MemberFn = Arc::new(move |instance: &BeanInstance, args: &InjectionArgs| -> Result<(), BoxError> {
            let target = instance
                .downcast::<T>()
                .ok_or_else(|| format!("实例类型 {} 与 Bean 类不一致", instance.type_info()))?;
            invoke(&target, args)
        });
        self.methods.push(AnnotatedMethod {
            name: method.clone(),
            kind: MethodKind::Initializer {
                parameters: parameters.clone(),
            },
            annotations: vec![Annotation::Inject],
        });
        self.initializers.push(MemberInjector {
            member: method,
            injection_points: parameters,
            inject,
        });
        self
    }

    /// 声明构造完成回调
    pub fn post_construct<F>(mut self, method: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let method = method.into();
        if self.post_construct.is_some() {
            self.declaration_errors
                .push(format!("声明了多个 @PostConstruct 方法: {}", method));
            return self;
        }
        self.methods.push(AnnotatedMethod {
            name: method.clone(),
            kind: MethodKind::PostConstruct,
            annotations: vec![Annotation::PostConstruct],
        });
        self.post_construct = Some(LifecycleCallback {
            method,
            invoke: typed_callback(invoke),
        });
        self
    }

    /// 声明销毁前回调
    pub fn pre_destroy<F>(mut self, method: impl Into<String>, invoke: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let method = method.into();
        if self.pre_destroy.is_some() {
            self.declaration_errors
                .push(format!("声明了多个 @PreDestroy 方法: {}", method));
            return self;
        }
        self.methods.push(AnnotatedMethod {
            name: method.clone(),
            kind: MethodKind::PreDestroy,
            annotations: vec![Annotation::PreDestroy],
        });
        self.pre_destroy = Some(LifecycleCallback {
            method,
            invoke: typed_callback(invoke),
        });
        self
    }

    /// 声明观察者方法
    pub fn observes<E, F>(self, method: impl Into<String>, notify: F) -> Self
    where
        E: Any + Send + Sync,
        F: Fn(&T, &E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.observes_with(method, ObserverOptions::default(), notify)
    }

    /// 声明带选项的观察者方法
    pub fn observes_with<E, F>(self, method: impl Into<String>, options: ObserverOptions, notify: F) -> Self
    where
        E: Any + Send + Sync,
        F: Fn(&T, &E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let erased: BeanObserverFn = Arc::new(move |instance: &BeanInstance, event: &ErasedEvent| -> Result<(), BoxError> {
            let Some(event) = event.downcast_ref::<E>() else {
                return Ok(());
            };
            let target = instance
                .downcast::<T>()
                .ok_or_else(|| format!("实例类型 {} 与 Bean 类不一致", instance.type_info()))?;
            notify(&target, event)
        });
        self.push_observer(method.into(), ObservedType::Exact(TypeInfo::of::<E>()), options, erased)
    }

    /// 声明接收所有事件的观察者方法
    pub fn observes_any<F>(self, method: impl Into<String>, options: ObserverOptions, notify: F) -> Self
    where
        F: Fn(&T, &ErasedEvent) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let erased: BeanObserverFn = Arc::new(move |instance: &BeanInstance, event: &ErasedEvent| -> Result<(), BoxError> {
            let target = instance
                .downcast::<T>()
                .ok_or_else(|| format!("实例类型 {} 与 Bean 类不一致", instance.type_info()))?;
            notify(&target, event)
        });
        self.push_observer(method.into(), ObservedType::Any, options, erased)
    }

    fn push_observer(
        mut self,
        method: String,
        observed: ObservedType,
        options: ObserverOptions,
        notify: BeanObserverFn,
    ) -> Self {
        let event_type = match &observed {
            ObservedType::Exact(type_info) => Some(type_info.clone()),
            ObservedType::Any => None,
        };
        self.methods.push(AnnotatedMethod {
            name: method.clone(),
            kind: MethodKind::Observer { event_type },
            annotations: vec![Annotation::Observes],
        });
        self.observers.push(ObserverDeclaration {
            method,
            observed,
            options,
            notify,
        });
        self
    }

    /// 构建 Bean 类
    pub fn build(self) -> BeanClass {
        let mut declaration_errors = self.declaration_errors;
        let (constructor, constructor_fn) = match self.constructor {
            Some((constructor, create)) => (Some(constructor), Some(create)),
            None => {
                declaration_errors.push("没有声明构造器".to_string());
                (None, None)
            }
        };

        let annotated_type = AnnotatedType::from_parts(
            self.id.unwrap_or_else(|| self.type_info.module_path.clone()),
            self.type_info,
            self.annotations,
            constructor,
            self.fields,
            self.methods,
            self.exposed_types,
        );

        BeanClass {
            inner: Arc::new(BeanClassInner {
                annotated_type,
                constructor: constructor_fn,
                fields: self.field_injectors,
                initializers: self.initializers,
                post_construct: self.post_construct,
                pre_destroy: self.pre_destroy,
                observers: self.observers,
                views: self.views,
                declaration_errors,
            }),
        }
    }
}

impl<T: Send + Sync + 'static> Default for BeanClassBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn typed_callback<T, F>(invoke: F) -> CallbackFn
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(move |instance: &BeanInstance| -> Result<(), BoxError> {
        let target = instance
            .downcast::<T>()
            .ok_or_else(|| format!("实例类型 {} 与 Bean 类不一致", instance.type_info()))?;
        invoke(&target)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Default)]
    struct Console {
        prefix: Mutex<String>,
    }

    impl Greeter for Console {
        fn greet(&self) -> String {
            format!("{}hello", self.prefix.lock().unwrap())
        }
    }

    #[test]
    fn test_builder_records_annotated_model() {
        let class = BeanClass::builder::<Console>()
            .scope(BeanScope::Application)
            .named("console")
            .exposes::<dyn Greeter, _>(|c| c as Arc<dyn Greeter>)
            .default_constructor()
            .inject_field("prefix", Dependency::on::<String>(), |c: &Console, p: Arc<String>| {
                *c.prefix.lock().unwrap() = p.to_string();
                Ok(())
            })
            .post_construct("init", |_| Ok(()))
            .build();

        let annotated = class.annotated_type();
        assert_eq!(annotated.scope(), Some(BeanScope::Application));
        assert_eq!(annotated.name(), Some("console"));
        assert_eq!(annotated.exposed_types().len(), 2);
        assert_eq!(annotated.injection_points().len(), 1);
        assert!(class.declaration_errors().is_empty());
        assert!(class.post_construct().is_some());
    }

    #[test]
    fn test_view_coerces_to_trait_object() {
        let class = BeanClass::builder::<Console>()
            .exposes::<dyn Greeter, _>(|c| c as Arc<dyn Greeter>)
            .default_constructor()
            .build();

        let instance = class.construct(&InjectionArgs::default()).unwrap();
        let view = class
            .view(&TypeInfo::of::<dyn Greeter>(), &instance)
            .unwrap();
        assert_eq!(view.downcast::<dyn Greeter>().unwrap().greet(), "hello");

        let same = class.view(&TypeInfo::of::<Console>(), &instance).unwrap();
        assert!(same.same_handle(&instance));
        assert!(class.view(&TypeInfo::of::<String>(), &instance).is_none());
    }

    #[test]
    fn test_malformed_declarations_are_recorded() {
        let class = BeanClass::builder::<Console>()
            .scope(BeanScope::Application)
            .scope(BeanScope::Request)
            .post_construct("a", |_| Ok(()))
            .post_construct("b", |_| Ok(()))
            .inject_field("prefix", Dependency::on::<u32>(), |_: &Console, _: Arc<String>| Ok(()))
            .build();

        // 重复作用域、重复回调、字段类型不一致、缺少构造器
        assert_eq!(class.declaration_errors().len(), 4);
        assert!(!class.has_constructor());
        assert!(class.construct(&InjectionArgs::default()).is_err());
    }
}
