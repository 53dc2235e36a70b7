//! 作用域上下文实现

use di_abstractions::{BeanId, BeanInstance, Context, ContextualInstance, CreateFn};
use infrastructure_common::{BeanScope, CreationError, Scope};
use parking_lot::{Mutex, ReentrantMutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 作用域上下文
///
/// 应用上下文由 Bean 管理器持有；请求和会话上下文由调用方创建并显式传入查找调用，
/// 调用方负责在请求或会话结束时调用 [`Context::destroy`]。
#[derive(Debug)]
pub struct ScopeContext {
    scope: BeanScope,
    identity: Scope,
    active: AtomicBool,
    /// 按创建顺序保存
    instances: Mutex<Vec<ContextualInstance>>,
    /// 每个 Bean 一把创建锁，并发的首次查找只创建一次
    creation_gates: Mutex<HashMap<BeanId, Arc<ReentrantMutex<()>>>>,
}

impl ScopeContext {
    /// 创建激活的上下文
    pub fn new(scope: BeanScope) -> Self {
        let identity = Scope::new(scope.to_string());
        debug!("创建 {} 上下文: {}", scope, identity.id);
        Self {
            scope,
            identity,
            active: AtomicBool::new(true),
            instances: Mutex::new(Vec::new()),
            creation_gates: Mutex::new(HashMap::new()),
        }
    }

    /// 上下文标识
    pub fn identity(&self) -> &Scope {
        &self.identity
    }

    /// 实例数量
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// 是否没有实例
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    fn creation_gate(&self, bean: BeanId) -> Arc<ReentrantMutex<()>> {
        self.creation_gates
            .lock()
            .entry(bean)
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .clone()
    }
}

impl Context for ScopeContext {
    fn scope(&self) -> BeanScope {
        self.scope
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn get(&self, bean: BeanId) -> Option<BeanInstance> {
        self.instances
            .lock()
            .iter()
            .find(|c| c.bean == bean)
            .map(|c| c.instance.clone())
    }

    fn get_or_create(&self, bean: BeanId, create: &mut CreateFn<'_>) -> Result<BeanInstance, CreationError> {
        if !self.is_active() {
            return Err(CreationError::ContextNotActive {
                scope: self.scope.to_string(),
            });
        }
        if let Some(existing) = self.get(bean) {
            return Ok(existing);
        }

        // 同一线程上的递归创建不会阻塞，由解析链的深度限制终止
        let gate = self.creation_gate(bean);
        let _creating = gate.lock();
        if let Some(existing) = self.get(bean) {
            return Ok(existing);
        }
        if !self.is_active() {
            return Err(CreationError::ContextNotActive {
                scope: self.scope.to_string(),
            });
        }

        let created = create()?;
        let instance = created.instance.clone();
        self.instances.lock().push(created);
        Ok(instance)
    }

    fn destroy_instance(&self, bean: BeanId) -> bool {
        let removed = {
            let mut instances = self.instances.lock();
            instances
                .iter()
                .position(|c| c.bean == bean)
                .map(|index| instances.remove(index))
        };
        match removed {
            Some(instance) => {
                if let Err(e) = instance.destroy() {
                    warn!("销毁实例 {} 失败: {}", bean, e);
                }
                true
            }
            None => false,
        }
    }

    fn destroy(&self) -> usize {
        self.active.store(false, Ordering::SeqCst);
        let instances = std::mem::take(&mut *self.instances.lock());
        let count = instances.len();

        // 先创建的实例通常是后创建实例的依赖，逆序销毁
        for instance in instances.into_iter().rev() {
            let bean = instance.bean;
            if let Err(e) = instance.destroy() {
                warn!("销毁实例 {} 失败: {}", bean, e);
            }
        }

        if count > 0 {
            info!("{} 上下文 {} 已销毁 {} 个实例", self.scope, self.identity.id, count);
        }
        count
    }
}
