//! Bean 注册表与类型安全解析

use crate::injection_target::DefaultInjectionTarget;
use di_abstractions::{format_qualifiers, Bean, BeanClass, BeanId, ObserverMethod, Qualifier};
use infrastructure_common::{DefinitionError, ResolutionError, TypeInfo};
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 已注册的 Bean
pub struct RegisteredBean {
    bean: Bean,
    class: BeanClass,
    target: OnceCell<Arc<DefaultInjectionTarget>>,
}

impl RegisteredBean {
    /// Bean 元数据
    pub fn bean(&self) -> &Bean {
        &self.bean
    }

    /// Bean 类
    pub fn class(&self) -> &BeanClass {
        &self.class
    }

    /// 注入目标，第一次创建实例时才构建
    pub fn injection_target(&self) -> Arc<DefaultInjectionTarget> {
        self.target
            .get_or_init(|| {
                debug!("创建注入目标: {}", self.bean);
                Arc::new(DefaultInjectionTarget::new(self.bean.clone(), self.class.clone()))
            })
            .clone()
    }
}

impl std::fmt::Debug for RegisteredBean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredBean")
            .field("bean", &self.bean)
            .field("target_created", &self.target.get().is_some())
            .finish()
    }
}

struct ObserverEntry {
    seq: u64,
    observer: ObserverMethod,
}

impl ObserverEntry {
    /// 与事件分发器相同的排序规则
    fn sort_key(&self) -> (bool, i32, u64) {
        let priority = self.observer.priority();
        (priority.is_none(), priority.unwrap_or(0), self.seq)
    }
}

/// Bean 注册表
///
/// 每个 Bean 类最多注册一次，Bean 标识即注册序号
#[derive(Default)]
pub struct BeanRegistry {
    beans: Vec<Arc<RegisteredBean>>,
    by_class: HashMap<TypeId, BeanId>,
    observers: Vec<ObserverEntry>,
    next_observer_seq: u64,
    enabled_alternatives: Vec<String>,
}

impl BeanRegistry {
    /// 注册 Bean 类
    pub fn register(&mut self, class: &BeanClass) -> Result<Arc<RegisteredBean>, DefinitionError> {
        let type_info = class.type_info();
        if self.by_class.contains_key(&type_info.id) {
            return Err(DefinitionError::DuplicateBean {
                type_name: type_info.module_path.clone(),
            });
        }

        let id = BeanId(self.beans.len() as u64);
        let registered = Arc::new(RegisteredBean {
            bean: Bean::from_annotated_type(id, class.annotated_type()),
            class: class.clone(),
            target: OnceCell::new(),
        });
        self.by_class.insert(type_info.id, id);
        self.beans.push(registered.clone());
        Ok(registered)
    }

    /// 启用备选 Bean
    pub fn enable_alternatives(&mut self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if !self.enabled_alternatives.contains(&name) {
                self.enabled_alternatives.push(name);
            }
        }
    }

    /// 已启用的备选 Bean 名称
    pub fn enabled_alternatives(&self) -> &[String] {
        &self.enabled_alternatives
    }

    /// Bean 是否参与解析
    ///
    /// 备选 Bean 只有在声明了优先级或被显式启用时才参与解析
    pub fn is_enabled(&self, bean: &Bean) -> bool {
        if !bean.is_alternative() || bean.priority().is_some() {
            return true;
        }
        let class = bean.bean_class();
        self.enabled_alternatives
            .iter()
            .any(|name| *name == class.name || *name == class.module_path)
    }

    /// 按标识获取 Bean
    pub fn get(&self, id: BeanId) -> Option<Arc<RegisteredBean>> {
        self.beans.get(id.0 as usize).cloned()
    }

    /// 按 Bean 类获取 Bean
    pub fn get_by_class(&self, type_id: TypeId) -> Option<Arc<RegisteredBean>> {
        self.by_class.get(&type_id).and_then(|id| self.get(*id))
    }

    /// 全部已注册 Bean
    pub fn all(&self) -> &[Arc<RegisteredBean>] {
        &self.beans
    }

    /// 已注册 Bean 数量
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    /// 是否没有 Bean
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// 匹配类型和限定符的已启用 Bean
    pub fn candidates(&self, type_id: TypeId, qualifiers: &[Qualifier]) -> Vec<Arc<RegisteredBean>> {
        self.beans
            .iter()
            .filter(|r| self.is_enabled(&r.bean) && r.bean.matches(type_id, qualifiers))
            .cloned()
            .collect()
    }

    /// 类型安全解析
    ///
    /// 多个候选时先保留备选 Bean，再保留优先级最高的 Bean，仍不唯一则存在歧义
    pub fn resolve(
        &self,
        required: &TypeInfo,
        qualifiers: &[Qualifier],
    ) -> Result<Arc<RegisteredBean>, ResolutionError> {
        let candidates = self.candidates(required.id, qualifiers);
        match candidates.len() {
            0 => Err(ResolutionError::Unsatisfied {
                required_type: required.to_string(),
                qualifiers: format_qualifiers(qualifiers),
            }),
            1 => Ok(candidates[0].clone()),
            _ => {
                let names: Vec<String> = candidates.iter().map(|c| c.bean.to_string()).collect();
                let mut remaining = candidates;

                if remaining.iter().any(|c| c.bean.is_alternative()) {
                    remaining.retain(|c| c.bean.is_alternative());
                }
                if remaining.len() > 1 {
                    if let Some(highest) = remaining.iter().filter_map(|c| c.bean.priority()).max() {
                        remaining.retain(|c| c.bean.priority() == Some(highest));
                    }
                }

                if remaining.len() == 1 {
                    return Ok(remaining.remove(0));
                }
                Err(ResolutionError::Ambiguous {
                    required_type: required.to_string(),
                    qualifiers: format_qualifiers(qualifiers),
                    candidates: names,
                })
            }
        }
    }

    /// 按名称查找已启用的 Bean
    pub fn by_name(&self, name: &str) -> Vec<Arc<RegisteredBean>> {
        self.beans
            .iter()
            .filter(|r| self.is_enabled(&r.bean) && r.bean.name() == Some(name))
            .cloned()
            .collect()
    }

    /// 注册观察者，按优先级插入
    pub fn register_observer(&mut self, observer: ObserverMethod) {
        let entry = ObserverEntry {
            seq: self.next_observer_seq,
            observer,
        };
        self.next_observer_seq += 1;

        let key = entry.sort_key();
        let position = self
            .observers
            .partition_point(|existing| existing.sort_key() <= key);
        self.observers.insert(position, entry);
    }

    /// 匹配事件类型和限定符的观察者，按通知顺序排列
    pub fn observers_for(&self, event_type: TypeId, qualifiers: &[Qualifier]) -> Vec<ObserverMethod> {
        self.observers
            .iter()
            .filter(|entry| entry.observer.matches(event_type, qualifiers))
            .map(|entry| entry.observer.clone())
            .collect()
    }

    /// 观察者数量
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::BeanScope;

    trait Notifier: Send + Sync {}

    #[derive(Default)]
    struct Email;
    impl Notifier for Email {}

    #[derive(Default)]
    struct Sms;
    impl Notifier for Sms {}

    #[derive(Default)]
    struct Pager;
    impl Notifier for Pager {}

    fn notifier<T: Notifier + Default + 'static>() -> di_abstractions::BeanClassBuilder<T> {
        BeanClass::builder::<T>()
            .exposes::<dyn Notifier, _>(|n| n as Arc<dyn Notifier>)
            .default_constructor()
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = BeanRegistry::default();
        let class = notifier::<Email>().build();

        registry.register(&class).unwrap();
        let error = registry.register(&class).unwrap_err();

        assert!(matches!(error, DefinitionError::DuplicateBean { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ambiguous_and_unsatisfied() {
        let mut registry = BeanRegistry::default();
        let required = TypeInfo::of::<dyn Notifier>();

        assert!(matches!(
            registry.resolve(&required, &[]),
            Err(ResolutionError::Unsatisfied { .. })
        ));

        registry.register(&notifier::<Email>().build()).unwrap();
        registry.register(&notifier::<Sms>().build()).unwrap();

        match registry.resolve(&required, &[]) {
            Err(ResolutionError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["Email", "Sms"]);
            }
            other => panic!("期望歧义错误，实际: {:?}", other.map(|r| r.bean().to_string())),
        }
    }

    #[test]
    fn test_alternative_wins_only_when_enabled() {
        let mut registry = BeanRegistry::default();
        let required = TypeInfo::of::<dyn Notifier>();
        registry.register(&notifier::<Email>().build()).unwrap();
        registry
            .register(&notifier::<Sms>().alternative().build())
            .unwrap();

        let resolved = registry.resolve(&required, &[]).unwrap();
        assert_eq!(resolved.bean().bean_class().name, "Email");

        registry.enable_alternatives(vec!["Sms".to_string()]);
        let resolved = registry.resolve(&required, &[]).unwrap();
        assert_eq!(resolved.bean().bean_class().name, "Sms");
    }

    #[test]
    fn test_highest_priority_alternative_wins() {
        let mut registry = BeanRegistry::default();
        registry.register(&notifier::<Email>().build()).unwrap();
        registry
            .register(&notifier::<Sms>().alternative().priority(10).build())
            .unwrap();
        registry
            .register(&notifier::<Pager>().alternative().priority(20).build())
            .unwrap();

        let resolved = registry.resolve(&TypeInfo::of::<dyn Notifier>(), &[]).unwrap();
        assert_eq!(resolved.bean().bean_class().name, "Pager");
    }

    #[test]
    fn test_qualified_and_named_lookup() {
        let mut registry = BeanRegistry::default();
        registry
            .register(&notifier::<Email>().named("email").build())
            .unwrap();
        registry
            .register(
                &notifier::<Sms>()
                    .qualifier(Qualifier::custom("Urgent"))
                    .scope(BeanScope::Application)
                    .build(),
            )
            .unwrap();

        let required = TypeInfo::of::<dyn Notifier>();
        let urgent = registry
            .resolve(&required, &[Qualifier::custom("Urgent")])
            .unwrap();
        assert_eq!(urgent.bean().bean_class().name, "Sms");

        // Sms 带自定义限定符，不再携带 @Default
        let default = registry.resolve(&required, &[]).unwrap();
        assert_eq!(default.bean().bean_class().name, "Email");

        assert_eq!(registry.by_name("email").len(), 1);
        assert_eq!(registry.candidates(required.id, &[Qualifier::Any]).len(), 2);
    }

    #[test]
    fn test_observers_sorted_by_priority() {
        let mut registry = BeanRegistry::default();
        registry.register_observer(ObserverMethod::synthetic("late", |_: &u32| Ok(())));
        registry.register_observer(
            ObserverMethod::synthetic("second", |_: &u32| Ok(()))
                .with_options(di_abstractions::ObserverOptions::default().priority(200)),
        );
        registry.register_observer(
            ObserverMethod::synthetic("first", |_: &u32| Ok(()))
                .with_options(di_abstractions::ObserverOptions::default().priority(100)),
        );
        registry.register_observer(ObserverMethod::synthetic("other", |_: &String| Ok(())));

        let names: Vec<String> = registry
            .observers_for(TypeId::of::<u32>(), &[])
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "late"]);
    }
}
