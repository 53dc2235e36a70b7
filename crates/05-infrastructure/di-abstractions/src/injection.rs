//! 注入点与实例句柄

use crate::annotated::{format_qualifiers, Qualifier};
use infrastructure_common::{BoxError, TypeInfo};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的 Bean 实例句柄
///
/// 内部保存 `Arc<V>`，`V` 可以是具体类型也可以是 trait object。
/// 克隆句柄共享同一组生命周期标记。
#[derive(Clone)]
pub struct BeanInstance {
    inner: Arc<dyn Any + Send + Sync>,
    type_info: TypeInfo,
    lifecycle: Arc<LifecycleFlags>,
}

/// 实例生命周期标记
#[derive(Debug, Default)]
pub struct LifecycleFlags {
    post_constructed: Mutex<bool>,
    destroyed: Mutex<bool>,
}

impl LifecycleFlags {
    /// 只在第一次成功执行时运行构造完成回调
    pub fn run_post_construct<E>(&self, callback: impl FnOnce() -> Result<(), E>) -> Result<bool, E> {
        let mut done = self.post_constructed.lock();
        if *done {
            return Ok(false);
        }
        callback()?;
        *done = true;
        Ok(true)
    }

    /// 只在第一次成功执行时运行销毁前回调
    pub fn run_pre_destroy<E>(&self, callback: impl FnOnce() -> Result<(), E>) -> Result<bool, E> {
        let mut done = self.destroyed.lock();
        if *done {
            return Ok(false);
        }
        callback()?;
        *done = true;
        Ok(true)
    }

    /// 构造完成回调是否已执行
    pub fn is_post_constructed(&self) -> bool {
        *self.post_constructed.lock()
    }

    /// 销毁前回调是否已执行
    pub fn is_destroyed(&self) -> bool {
        *self.destroyed.lock()
    }
}

impl BeanInstance {
    /// 包装实例
    pub fn new<V: ?Sized + Send + Sync + 'static>(value: Arc<V>) -> Self {
        Self {
            inner: Arc::new(value),
            type_info: TypeInfo::of::<V>(),
            lifecycle: Arc::new(LifecycleFlags::default()),
        }
    }

    /// 转换为指定类型
    pub fn downcast<V: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<V>> {
        self.inner.downcast_ref::<Arc<V>>().cloned()
    }

    /// 实例类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 生命周期标记
    pub fn lifecycle(&self) -> &LifecycleFlags {
        &self.lifecycle
    }

    /// 是否为同一个句柄
    pub fn same_handle(&self, other: &BeanInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("type", &self.type_info.name)
            .field("post_constructed", &self.lifecycle.is_post_constructed())
            .field("destroyed", &self.lifecycle.is_destroyed())
            .finish()
    }
}

/// 依赖声明：所需类型加限定符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// 所需类型
    pub required_type: TypeInfo,
    /// 所需限定符，为空表示 `@Default`
    pub qualifiers: Vec<Qualifier>,
}

impl Dependency {
    /// 声明对类型 `V` 的依赖
    pub fn on<V: ?Sized + 'static>() -> Self {
        Self {
            required_type: TypeInfo::of::<V>(),
            qualifiers: Vec::new(),
        }
    }

    /// 添加限定符
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        if !self.qualifiers.contains(&qualifier) {
            self.qualifiers.push(qualifier);
        }
        self
    }

    /// 添加名称限定符
    pub fn named(self, name: impl Into<String>) -> Self {
        self.qualified(Qualifier::named(name))
    }
}

/// 注入点种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionPointKind {
    /// 构造参数
    ConstructorParameter { index: usize },
    /// 字段
    Field { name: String },
    /// 初始化方法参数
    InitializerParameter { method: String, index: usize },
}

/// 注入点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// 声明注入点的类型
    pub declaring_type: TypeInfo,
    /// 依赖声明
    pub dependency: Dependency,
    /// 注入点种类
    pub kind: InjectionPointKind,
}

impl InjectionPoint {
    /// 创建注入点
    pub fn new(declaring_type: TypeInfo, dependency: Dependency, kind: InjectionPointKind) -> Self {
        Self {
            declaring_type,
            dependency,
            kind,
        }
    }

    /// 所需类型
    pub fn required_type(&self) -> &TypeInfo {
        &self.dependency.required_type
    }

    /// 所需限定符
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.dependency.qualifiers
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InjectionPointKind::ConstructorParameter { index } => {
                write!(f, "{}::new#{}", self.declaring_type, index)?
            }
            InjectionPointKind::Field { name } => write!(f, "{}.{}", self.declaring_type, name)?,
            InjectionPointKind::InitializerParameter { method, index } => {
                write!(f, "{}::{}#{}", self.declaring_type, method, index)?
            }
        }
        write!(
            f,
            " ({} {})",
            format_qualifiers(&self.dependency.qualifiers),
            self.dependency.required_type
        )
    }
}

/// 已解析的注入参数
#[derive(Debug, Default)]
pub struct InjectionArgs {
    values: Vec<BeanInstance>,
}

impl InjectionArgs {
    /// 创建注入参数
    pub fn new(values: Vec<BeanInstance>) -> Self {
        Self { values }
    }

    /// 获取第 `index` 个参数并转换为 `V`
    pub fn get<V: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<V>, BoxError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| format!("注入参数 #{} 不存在，共 {} 个参数", index, self.values.len()))?;
        value.downcast::<V>().ok_or_else(|| {
            format!(
                "注入参数 #{} 的类型为 {}，无法转换为 {}",
                index,
                value.type_info(),
                TypeInfo::of::<V>()
            )
            .into()
        })
    }

    /// 参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Send + Sync {
        fn area(&self) -> u32;
    }

    struct Square(u32);

    impl Shape for Square {
        fn area(&self) -> u32 {
            self.0 * self.0
        }
    }

    #[test]
    fn test_trait_object_round_trip() {
        let square: Arc<dyn Shape> = Arc::new(Square(3));
        let instance = BeanInstance::new(square);

        let shape = instance.downcast::<dyn Shape>().unwrap();
        assert_eq!(shape.area(), 9);
        assert!(instance.downcast::<Square>().is_none());
        assert_eq!(instance.type_info().short_name(), "dyn Shape");
    }

    #[test]
    fn test_lifecycle_runs_once_after_success() {
        let flags = LifecycleFlags::default();

        let failed: Result<bool, &str> = flags.run_post_construct(|| Err("first attempt"));
        assert!(failed.is_err());
        assert!(!flags.is_post_constructed());

        assert_eq!(flags.run_post_construct(|| Ok::<(), &str>(())), Ok(true));
        assert_eq!(flags.run_post_construct(|| Err("must not run")), Ok(false));
        assert!(flags.is_post_constructed());
    }

    #[test]
    fn test_injection_args_report_mismatch() {
        let args = InjectionArgs::new(vec![BeanInstance::new(Arc::new(7_u32))]);

        assert_eq!(*args.get::<u32>(0).unwrap(), 7);
        assert!(args.get::<String>(0).is_err());
        assert!(args.get::<u32>(1).is_err());
    }

    #[test]
    fn test_injection_point_display() {
        let point = InjectionPoint::new(
            TypeInfo::of::<Square>(),
            Dependency::on::<dyn Shape>().named("unit"),
            InjectionPointKind::Field {
                name: "shape".to_string(),
            },
        );
        assert_eq!(point.to_string(), "Square.shape (@Named(\"unit\") dyn Shape)");
    }
}
