//! 注解类型模型
//!
//! 以显式描述符代替运行时反射，在注册时记录类型的注解、构造器、字段和方法

use crate::injection::InjectionPoint;
use infrastructure_common::{BeanScope, TypeInfo};
use std::fmt;

/// 限定符
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Qualifier {
    /// 未声明限定符的 Bean 与注入点默认携带
    Default,
    /// 所有 Bean 都携带
    Any,
    /// 按名称限定
    Named(String),
    /// 自定义限定符
    Custom(String),
}

impl Qualifier {
    /// 创建名称限定符
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// 创建自定义限定符
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("@Default"),
            Self::Any => f.write_str("@Any"),
            Self::Named(name) => write!(f, "@Named(\"{}\")", name),
            Self::Custom(name) => write!(f, "@{}", name),
        }
    }
}

/// 格式化限定符列表
pub fn format_qualifiers(qualifiers: &[Qualifier]) -> String {
    if qualifiers.is_empty() {
        return Qualifier::Default.to_string();
    }
    qualifiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 注解
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// 作用域注解，同时是 Bean 定义注解
    Scope(BeanScope),
    /// 限定符
    Qualifier(Qualifier),
    /// 备选 Bean
    Alternative,
    /// 优先级
    Priority(i32),
    /// 排除出 Bean 发现
    Vetoed,
    /// 注入点
    Inject,
    /// 构造完成回调
    PostConstruct,
    /// 销毁前回调
    PreDestroy,
    /// 观察者方法
    Observes,
    /// 自定义标记
    Marker(String),
}

/// 注解构造器
#[derive(Debug, Clone)]
pub struct AnnotatedConstructor {
    /// 构造参数注入点，按参数顺序排列
    pub parameters: Vec<InjectionPoint>,
}

/// 注解字段
#[derive(Debug, Clone)]
pub struct AnnotatedField {
    /// 字段名称
    pub name: String,
    /// 字段注入点
    pub injection_point: InjectionPoint,
    /// 字段注解
    pub annotations: Vec<Annotation>,
}

/// 方法种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind {
    /// 初始化方法，构造和字段注入之后调用
    Initializer { parameters: Vec<InjectionPoint> },
    /// 构造完成回调
    PostConstruct,
    /// 销毁前回调
    PreDestroy,
    /// 观察者方法
    Observer { event_type: Option<TypeInfo> },
}

/// 注解方法
#[derive(Debug, Clone)]
pub struct AnnotatedMethod {
    /// 方法名称
    pub name: String,
    /// 方法种类
    pub kind: MethodKind,
    /// 方法注解
    pub annotations: Vec<Annotation>,
}

/// 注解类型
///
/// 创建后不可变，由 Bean 管理器的类型缓存持有
#[derive(Debug, Clone)]
pub struct AnnotatedType {
    id: String,
    type_info: TypeInfo,
    annotations: Vec<Annotation>,
    constructor: Option<AnnotatedConstructor>,
    fields: Vec<AnnotatedField>,
    methods: Vec<AnnotatedMethod>,
    exposed_types: Vec<TypeInfo>,
}

impl AnnotatedType {
    /// 创建只有类型信息的注解类型
    pub fn bare(type_info: TypeInfo) -> Self {
        Self {
            id: type_info.module_path.clone(),
            exposed_types: vec![type_info.clone()],
            type_info,
            annotations: Vec::new(),
            constructor: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        id: String,
        type_info: TypeInfo,
        annotations: Vec<Annotation>,
        constructor: Option<AnnotatedConstructor>,
        fields: Vec<AnnotatedField>,
        methods: Vec<AnnotatedMethod>,
        exposed_types: Vec<TypeInfo>,
    ) -> Self {
        Self {
            id,
            type_info,
            annotations,
            constructor,
            fields,
            methods,
            exposed_types,
        }
    }

    /// 追加注解后的副本，作用域和优先级注解会替换已有的声明
    pub fn with_annotations(&self, extra: impl IntoIterator<Item = Annotation>) -> Self {
        let mut copy = self.clone();
        for annotation in extra {
            match annotation {
                Annotation::Scope(_) => copy
                    .annotations
                    .retain(|a| !matches!(a, Annotation::Scope(_))),
                Annotation::Priority(_) => copy
                    .annotations
                    .retain(|a| !matches!(a, Annotation::Priority(_))),
                _ => {}
            }
            if !copy.annotations.contains(&annotation) {
                copy.annotations.push(annotation);
            }
        }
        copy
    }

    /// 注解类型标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 底层类型信息
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 全部注解
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// 构造器
    pub fn constructor(&self) -> Option<&AnnotatedConstructor> {
        self.constructor.as_ref()
    }

    /// 注入字段
    pub fn fields(&self) -> &[AnnotatedField] {
        &self.fields
    }

    /// 方法
    pub fn methods(&self) -> &[AnnotatedMethod] {
        &self.methods
    }

    /// Bean 类型集合，包含类型本身和暴露的 trait object
    pub fn exposed_types(&self) -> &[TypeInfo] {
        &self.exposed_types
    }

    /// 是否带有指定注解
    pub fn is_annotated(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }

    /// 声明的作用域
    pub fn scope(&self) -> Option<BeanScope> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Scope(scope) => Some(*scope),
            _ => None,
        })
    }

    /// 声明的限定符
    pub fn qualifiers(&self) -> Vec<Qualifier> {
        self.annotations
            .iter()
            .filter_map(|a| match a {
                Annotation::Qualifier(q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    /// Bean 名称
    pub fn name(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Qualifier(Qualifier::Named(name)) => Some(name.as_str()),
            _ => None,
        })
    }

    /// 优先级
    pub fn priority(&self) -> Option<i32> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Priority(p) => Some(*p),
            _ => None,
        })
    }

    /// 是否为备选 Bean
    pub fn is_alternative(&self) -> bool {
        self.is_annotated(&Annotation::Alternative)
    }

    /// 是否被排除
    pub fn is_vetoed(&self) -> bool {
        self.is_annotated(&Annotation::Vetoed)
    }

    /// 是否带有 Bean 定义注解（显式作用域）
    pub fn has_bean_defining_annotation(&self) -> bool {
        self.scope().is_some()
    }

    /// 指定种类的方法
    pub fn methods_of_kind<'a>(
        &'a self,
        matches: impl Fn(&MethodKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a AnnotatedMethod> + 'a {
        self.methods.iter().filter(move |m| matches(&m.kind))
    }

    /// 全部注入点：构造参数、字段、初始化方法参数
    pub fn injection_points(&self) -> Vec<InjectionPoint> {
        let mut points = Vec::new();
        if let Some(constructor) = &self.constructor {
            points.extend(constructor.parameters.iter().cloned());
        }
        points.extend(self.fields.iter().map(|f| f.injection_point.clone()));
        for method in &self.methods {
            if let MethodKind::Initializer { parameters } = &method.kind {
                points.extend(parameters.iter().cloned());
            }
        }
        points
    }
}

impl fmt::Display for AnnotatedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_info)?;
        if self.id != self.type_info.module_path {
            write!(f, "#{}", self.id)?;
        }
        Ok(())
    }
}
