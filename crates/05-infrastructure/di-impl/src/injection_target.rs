//! 默认注入目标实现

use di_abstractions::{
    Bean, BeanClass, BeanInstance, CreationalContext, InjectionArgs, InjectionPoint,
    InjectionTarget, MemberInjector, Producer,
};
use infrastructure_common::CreationError;
use tracing::debug;

/// 默认注入目标
///
/// 按 构造 -> 字段注入 -> 初始化方法 -> 构造完成回调 的顺序创建实例
pub struct DefaultInjectionTarget {
    bean: Bean,
    class: BeanClass,
    constructor_points: Vec<InjectionPoint>,
}

impl DefaultInjectionTarget {
    /// 创建注入目标
    pub fn new(bean: Bean, class: BeanClass) -> Self {
        let constructor_points = class
            .annotated_type()
            .constructor()
            .map(|c| c.parameters.clone())
            .unwrap_or_default();
        Self {
            bean,
            class,
            constructor_points,
        }
    }

    /// 对应的 Bean
    pub fn bean(&self) -> &Bean {
        &self.bean
    }

    fn resolve_all(
        &self,
        points: &[InjectionPoint],
        ctx: &mut CreationalContext,
    ) -> Result<InjectionArgs, CreationError> {
        let mut values = Vec::with_capacity(points.len());
        for point in points {
            values.push(ctx.resolve(point)?);
        }
        Ok(InjectionArgs::new(values))
    }

    fn inject_member(
        &self,
        injector: &MemberInjector,
        instance: &BeanInstance,
        ctx: &mut CreationalContext,
    ) -> Result<(), CreationError> {
        let args = self.resolve_all(&injector.injection_points, ctx)?;
        (injector.inject)(instance, &args).map_err(|source| CreationError::InjectionFailed {
            bean: self.bean.to_string(),
            member: injector.member.clone(),
            source,
        })
    }
}

impl Producer for DefaultInjectionTarget {
    fn produce(&self, ctx: &mut CreationalContext) -> Result<BeanInstance, CreationError> {
        let args = self.resolve_all(&self.constructor_points, ctx)?;
        let instance = self
            .class
            .construct(&args)
            .map_err(|source| CreationError::ConstructorFailed {
                bean: self.bean.to_string(),
                source,
            })?;
        debug!("构造 Bean 实例: {}", self.bean);
        Ok(instance)
    }

    fn injection_points(&self) -> &[InjectionPoint] {
        self.bean.injection_points()
    }
}

impl InjectionTarget for DefaultInjectionTarget {
    fn inject(&self, instance: &BeanInstance, ctx: &mut CreationalContext) -> Result<(), CreationError> {
        for injector in self.class.field_injectors() {
            self.inject_member(injector, instance, ctx)?;
        }
        for injector in self.class.initializers() {
            self.inject_member(injector, instance, ctx)?;
        }
        Ok(())
    }

    fn post_construct(&self, instance: &BeanInstance) -> Result<(), CreationError> {
        let Some(callback) = self.class.post_construct() else {
            return Ok(());
        };
        let invoked = instance
            .lifecycle()
            .run_post_construct(|| (callback.invoke)(instance))
            .map_err(|source| CreationError::LifecycleCallbackFailed {
                bean: self.bean.to_string(),
                method: callback.method.clone(),
                source,
            })?;
        if invoked {
            debug!("执行构造完成回调: {}.{}", self.bean, callback.method);
        }
        Ok(())
    }

    fn pre_destroy(&self, instance: &BeanInstance) -> Result<(), CreationError> {
        let Some(callback) = self.class.pre_destroy() else {
            return Ok(());
        };
        let invoked = instance
            .lifecycle()
            .run_pre_destroy(|| (callback.invoke)(instance))
            .map_err(|source| CreationError::LifecycleCallbackFailed {
                bean: self.bean.to_string(),
                method: callback.method.clone(),
                source,
            })?;
        if invoked {
            debug!("执行销毁前回调: {}.{}", self.bean, callback.method);
        }
        Ok(())
    }
}
