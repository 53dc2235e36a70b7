//! Bean 元数据

use crate::annotated::{AnnotatedType, Qualifier};
use crate::injection::InjectionPoint;
use infrastructure_common::{BeanScope, TypeInfo};
use std::any::TypeId;
use std::fmt;

/// Bean 标识，在同一个管理器内唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanId(pub u64);

impl fmt::Display for BeanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bean 元数据
///
/// 由注解类型推导，注册后在管理器生命周期内不变
#[derive(Debug, Clone)]
pub struct Bean {
    id: BeanId,
    bean_class: TypeInfo,
    annotated_type_id: String,
    types: Vec<TypeInfo>,
    qualifiers: Vec<Qualifier>,
    scope: BeanScope,
    name: Option<String>,
    alternative: bool,
    priority: Option<i32>,
    injection_points: Vec<InjectionPoint>,
}

impl Bean {
    /// 从注解类型推导 Bean 元数据
    ///
    /// 除名称外没有声明限定符的 Bean 携带 `@Default`，所有 Bean 都携带 `@Any`
    pub fn from_annotated_type(id: BeanId, annotated: &AnnotatedType) -> Self {
        let mut qualifiers: Vec<Qualifier> = Vec::new();
        for qualifier in annotated.qualifiers() {
            if !qualifiers.contains(&qualifier) {
                qualifiers.push(qualifier);
            }
        }
        let has_explicit = qualifiers
            .iter()
            .any(|q| !matches!(q, Qualifier::Named(_) | Qualifier::Any));
        if !has_explicit {
            qualifiers.push(Qualifier::Default);
        }
        if !qualifiers.contains(&Qualifier::Any) {
            qualifiers.push(Qualifier::Any);
        }

        Self {
            id,
            bean_class: annotated.type_info().clone(),
            annotated_type_id: annotated.id().to_string(),
            types: annotated.exposed_types().to_vec(),
            qualifiers,
            scope: annotated.scope().unwrap_or_default(),
            name: annotated.name().map(str::to_string),
            alternative: annotated.is_alternative(),
            priority: annotated.priority(),
            injection_points: annotated.injection_points(),
        }
    }

    /// Bean 标识
    pub fn id(&self) -> BeanId {
        self.id
    }

    /// Bean 类
    pub fn bean_class(&self) -> &TypeInfo {
        &self.bean_class
    }

    /// 来源注解类型的标识
    pub fn annotated_type_id(&self) -> &str {
        &self.annotated_type_id
    }

    /// Bean 类型集合
    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    /// 限定符
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    /// 作用域
    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    /// Bean 名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 是否为备选 Bean
    pub fn is_alternative(&self) -> bool {
        self.alternative
    }

    /// 优先级
    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    /// 注入点
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    /// 是否具有指定 Bean 类型
    pub fn has_type(&self, type_id: TypeId) -> bool {
        self.types.iter().any(|t| t.id == type_id)
    }

    /// 是否满足所需限定符，空列表表示 `@Default`
    pub fn has_qualifiers(&self, required: &[Qualifier]) -> bool {
        if required.is_empty() {
            return self.qualifiers.contains(&Qualifier::Default);
        }
        required.iter().all(|q| self.qualifiers.contains(q))
    }

    /// 是否匹配类型和限定符
    pub fn matches(&self, type_id: TypeId, required: &[Qualifier]) -> bool {
        self.has_type(type_id) && self.has_qualifiers(required)
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bean_class)?;
        if self.annotated_type_id != self.bean_class.module_path {
            write!(f, "#{}", self.annotated_type_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotated::Annotation;

    struct Mailer;

    fn bean_with(annotations: Vec<Annotation>) -> Bean {
        let annotated = AnnotatedType::bare(TypeInfo::of::<Mailer>()).with_annotations(annotations);
        Bean::from_annotated_type(BeanId(1), &annotated)
    }

    #[test]
    fn test_default_qualifiers() {
        let plain = bean_with(Vec::new());
        assert_eq!(plain.qualifiers(), &[Qualifier::Default, Qualifier::Any]);
        assert_eq!(plain.scope(), BeanScope::Dependent);
        assert!(plain.has_qualifiers(&[]));

        let named = bean_with(vec![Annotation::Qualifier(Qualifier::named("mailer"))]);
        assert_eq!(named.name(), Some("mailer"));
        assert!(named.has_qualifiers(&[]));
        assert!(named.has_qualifiers(&[Qualifier::named("mailer")]));
    }

    #[test]
    fn test_custom_qualifier_removes_default() {
        let bean = bean_with(vec![Annotation::Qualifier(Qualifier::custom("Smtp"))]);

        assert!(!bean.has_qualifiers(&[]));
        assert!(bean.has_qualifiers(&[Qualifier::custom("Smtp")]));
        assert!(bean.has_qualifiers(&[Qualifier::Any]));
        assert!(!bean.has_qualifiers(&[Qualifier::custom("Smtp"), Qualifier::custom("Async")]));
        assert!(bean.matches(TypeId::of::<Mailer>(), &[Qualifier::Any]));
        assert!(!bean.matches(TypeId::of::<String>(), &[Qualifier::Any]));
    }
}
