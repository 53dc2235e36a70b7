//! 实例创建抽象接口
//!
//! 定义生产者、注入目标、创建上下文以及作用域上下文

use crate::bean::BeanId;
use crate::injection::{BeanInstance, InjectionPoint};
use crate::resolver::{BeanResolver, ResolveContext};
use infrastructure_common::{BeanScope, CreationError};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// 生产者 trait
///
/// 负责创建 Bean 实例
pub trait Producer: Send + Sync {
    /// 通过构造器创建新实例，依赖通过创建上下文解析
    fn produce(&self, ctx: &mut CreationalContext) -> Result<BeanInstance, CreationError>;

    /// 生产者需要的全部注入点
    fn injection_points(&self) -> &[InjectionPoint];
}

/// 注入目标 trait
///
/// 在生产者之上负责成员注入和生命周期回调
pub trait InjectionTarget: Producer {
    /// 注入字段并调用初始化方法
    fn inject(&self, instance: &BeanInstance, ctx: &mut CreationalContext) -> Result<(), CreationError>;

    /// 调用构造完成回调，只在第一次成功时执行
    fn post_construct(&self, instance: &BeanInstance) -> Result<(), CreationError>;

    /// 调用销毁前回调，只在第一次成功时执行
    fn pre_destroy(&self, instance: &BeanInstance) -> Result<(), CreationError>;
}

/// 上下文实例
///
/// 持有实例、负责销毁它的注入目标以及随它一起销毁的依赖作用域实例
#[derive(Clone)]
pub struct ContextualInstance {
    /// 所属 Bean
    pub bean: BeanId,
    /// 实例
    pub instance: BeanInstance,
    /// 注入目标
    pub target: Arc<dyn InjectionTarget>,
    /// 依赖作用域的依赖实例
    pub dependents: Vec<ContextualInstance>,
}

impl ContextualInstance {
    /// 销毁实例及其依赖实例
    ///
    /// 依赖实例的销毁失败只记录日志，返回宿主实例的销毁结果
    pub fn destroy(self) -> Result<(), CreationError> {
        let result = self.target.pre_destroy(&self.instance);
        for dependent in self.dependents {
            let bean = dependent.bean;
            if let Err(e) = dependent.destroy() {
                warn!("销毁依赖实例 {} 失败: {}", bean, e);
            }
        }
        result
    }
}

impl fmt::Debug for ContextualInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualInstance")
            .field("bean", &self.bean)
            .field("instance", &self.instance)
            .field("dependents", &self.dependents)
            .finish()
    }
}

/// 实例创建回调
pub type CreateFn<'a> = dyn FnMut() -> Result<ContextualInstance, CreationError> + 'a;

/// 作用域上下文
pub trait Context: Send + Sync + fmt::Debug {
    /// 上下文对应的作用域
    fn scope(&self) -> BeanScope;

    /// 上下文是否处于激活状态
    fn is_active(&self) -> bool;

    /// 获取已存在的实例
    fn get(&self, bean: BeanId) -> Option<BeanInstance>;

    /// 获取实例，不存在时调用 `create` 创建
    ///
    /// 创建期间不持有上下文的锁，创建的实例可以再从同一上下文解析依赖
    fn get_or_create(&self, bean: BeanId, create: &mut CreateFn<'_>) -> Result<BeanInstance, CreationError>;

    /// 销毁单个实例
    fn destroy_instance(&self, bean: BeanId) -> bool;

    /// 销毁全部实例并使上下文失效，返回销毁的实例数量
    fn destroy(&self) -> usize;
}

/// 创建上下文
///
/// 贯穿一次实例创建，记录创建链、依赖作用域实例和可用的作用域上下文
pub struct CreationalContext {
    resolver: Arc<dyn BeanResolver>,
    resolve_context: ResolveContext,
    dependents: Vec<ContextualInstance>,
    contexts: Vec<Arc<dyn Context>>,
}

impl CreationalContext {
    /// 创建新的创建上下文
    pub fn new(resolver: Arc<dyn BeanResolver>, resolve_context: ResolveContext) -> Self {
        Self {
            resolver,
            resolve_context,
            dependents: Vec::new(),
            contexts: Vec::new(),
        }
    }

    /// 设置调用方传入的作用域上下文
    pub fn with_contexts(mut self, contexts: Vec<Arc<dyn Context>>) -> Self {
        self.contexts = contexts;
        self
    }

    /// 为依赖的创建派生子上下文，共享创建链和作用域上下文
    pub fn child(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            resolve_context: self.resolve_context.clone(),
            dependents: Vec::new(),
            contexts: self.contexts.clone(),
        }
    }

    /// 解析注入点
    pub fn resolve(&mut self, point: &InjectionPoint) -> Result<BeanInstance, CreationError> {
        let resolver = self.resolver.clone();
        resolver.resolve_injection_point(point, self)
    }

    /// 解析上下文
    pub fn resolve_context(&self) -> &ResolveContext {
        &self.resolve_context
    }

    /// 可变解析上下文
    pub fn resolve_context_mut(&mut self) -> &mut ResolveContext {
        &mut self.resolve_context
    }

    /// 查找指定作用域的上下文
    pub fn context_for(&self, scope: BeanScope) -> Option<Arc<dyn Context>> {
        self.contexts
            .iter()
            .find(|context| context.scope() == scope && context.is_active())
            .cloned()
    }

    /// 调用方传入的作用域上下文
    pub fn contexts(&self) -> &[Arc<dyn Context>] {
        &self.contexts
    }

    /// 记录依赖作用域实例
    pub fn add_dependent(&mut self, dependent: ContextualInstance) {
        self.dependents.push(dependent);
    }

    /// 取出记录的依赖作用域实例
    pub fn take_dependents(&mut self) -> Vec<ContextualInstance> {
        std::mem::take(&mut self.dependents)
    }

    /// 销毁已记录的依赖作用域实例，用于创建失败后的清理
    pub fn release(&mut self) {
        for dependent in self.take_dependents() {
            let bean = dependent.bean;
            if let Err(e) = dependent.destroy() {
                warn!("释放依赖实例 {} 失败: {}", bean, e);
            }
        }
    }
}

impl fmt::Debug for CreationalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationalContext")
            .field("chain", &self.resolve_context.describe())
            .field("dependents", &self.dependents.len())
            .field("contexts", &self.contexts)
            .finish()
    }
}
