//! 观察者方法

use crate::annotated::Qualifier;
use crate::bean::BeanId;
use crate::injection::BeanInstance;
use infrastructure_common::{BoxError, TypeInfo};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 类型擦除的事件
pub type ErasedEvent = dyn Any + Send + Sync;

/// Bean 观察者回调
pub type BeanObserverFn = Arc<dyn Fn(&BeanInstance, &ErasedEvent) -> Result<(), BoxError> + Send + Sync>;

/// 合成观察者回调
pub type SyntheticObserverFn = Arc<dyn Fn(&ErasedEvent) -> Result<(), BoxError> + Send + Sync>;

/// 观察的事件类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedType {
    /// 指定事件类型
    Exact(TypeInfo),
    /// 所有事件
    Any,
}

impl ObservedType {
    /// 是否匹配事件类型
    pub fn matches(&self, event_type: TypeId) -> bool {
        match self {
            Self::Exact(type_info) => type_info.id == event_type,
            Self::Any => true,
        }
    }
}

impl fmt::Display for ObservedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(type_info) => write!(f, "{}", type_info),
            Self::Any => f.write_str("*"),
        }
    }
}

/// 事件接收条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reception {
    /// 总是接收，必要时创建 Bean 实例
    #[default]
    Always,
    /// 只有上下文中已存在 Bean 实例时才接收
    IfExists,
}

/// 观察者选项
#[derive(Debug, Clone, Default)]
pub struct ObserverOptions {
    /// 事件限定符
    pub qualifiers: Vec<Qualifier>,
    /// 接收条件
    pub reception: Reception,
    /// 优先级，数值越小越先通知
    pub priority: Option<i32>,
}

impl ObserverOptions {
    /// 添加限定符
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// 设置接收条件
    pub fn reception(mut self, reception: Reception) -> Self {
        self.reception = reception;
        self
    }

    /// 设置优先级
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Bean 类声明的观察者
#[derive(Clone)]
pub struct ObserverDeclaration {
    /// 方法名称
    pub method: String,
    /// 观察的事件类型
    pub observed: ObservedType,
    /// 观察者选项
    pub options: ObserverOptions,
    /// 回调
    pub notify: BeanObserverFn,
}

impl fmt::Debug for ObserverDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverDeclaration")
            .field("method", &self.method)
            .field("observed", &self.observed)
            .field("options", &self.options)
            .finish()
    }
}

/// 观察者调用目标
#[derive(Clone)]
pub enum ObserverTarget {
    /// 在 Bean 的上下文实例上调用
    Bean { bean: BeanId, notify: BeanObserverFn },
    /// 不依赖 Bean 实例的合成观察者
    Synthetic { notify: SyntheticObserverFn },
}

/// 观察者方法
#[derive(Clone)]
pub struct ObserverMethod {
    name: String,
    observed: ObservedType,
    options: ObserverOptions,
    target: ObserverTarget,
}

impl ObserverMethod {
    /// 创建合成观察者
    pub fn synthetic<E, F>(name: impl Into<String>, notify: F) -> Self
    where
        E: Any + Send + Sync,
        F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let notify: SyntheticObserverFn = Arc::new(move |event: &ErasedEvent| {
            match event.downcast_ref::<E>() {
                Some(event) => notify(event),
                None => Ok(()),
            }
        });
        Self {
            name: name.into(),
            observed: ObservedType::Exact(TypeInfo::of::<E>()),
            options: ObserverOptions::default(),
            target: ObserverTarget::Synthetic { notify },
        }
    }

    /// 创建观察所有事件的合成观察者
    pub fn synthetic_any<F>(name: impl Into<String>, notify: F) -> Self
    where
        F: Fn(&ErasedEvent) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            observed: ObservedType::Any,
            options: ObserverOptions::default(),
            target: ObserverTarget::Synthetic {
                notify: Arc::new(notify),
            },
        }
    }

    /// 由 Bean 类的观察者声明创建
    pub fn for_bean(bean: BeanId, bean_name: &str, declaration: &ObserverDeclaration) -> Self {
        Self {
            name: format!("{}::{}", bean_name, declaration.method),
            observed: declaration.observed.clone(),
            options: declaration.options.clone(),
            target: ObserverTarget::Bean {
                bean,
                notify: declaration.notify.clone(),
            },
        }
    }

    /// 设置选项
    pub fn with_options(mut self, options: ObserverOptions) -> Self {
        self.options = options;
        self
    }

    /// 观察者名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 观察的事件类型
    pub fn observed(&self) -> &ObservedType {
        &self.observed
    }

    /// 限定符
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.options.qualifiers
    }

    /// 接收条件
    pub fn reception(&self) -> Reception {
        self.options.reception
    }

    /// 优先级
    pub fn priority(&self) -> Option<i32> {
        self.options.priority
    }

    /// 调用目标
    pub fn target(&self) -> &ObserverTarget {
        &self.target
    }

    /// 声明观察者的 Bean
    pub fn declaring_bean(&self) -> Option<BeanId> {
        match &self.target {
            ObserverTarget::Bean { bean, .. } => Some(*bean),
            ObserverTarget::Synthetic { .. } => None,
        }
    }

    /// 是否接收该事件
    ///
    /// 观察者的每个限定符都必须出现在事件限定符中；未带限定符的事件视为 `@Default`
    pub fn matches(&self, event_type: TypeId, event_qualifiers: &[Qualifier]) -> bool {
        if !self.observed.matches(event_type) {
            return false;
        }
        self.options.qualifiers.iter().all(|required| {
            *required == Qualifier::Any
                || event_qualifiers.contains(required)
                || (event_qualifiers.is_empty() && *required == Qualifier::Default)
        })
    }
}

impl fmt::Debug for ObserverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverMethod")
            .field("name", &self.name)
            .field("observed", &self.observed)
            .field("options", &self.options)
            .field("declaring_bean", &self.declaring_bean())
            .finish()
    }
}
