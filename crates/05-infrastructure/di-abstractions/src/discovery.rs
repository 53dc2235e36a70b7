//! Bean 归档
//!
//! 一个归档由可选的 `beans.toml` 描述符和一组候选 Bean 类组成

use crate::class::BeanClass;
use infrastructure_common::{DefinitionError, TypeInfo};
use serde::{Deserialize, Serialize};

/// 发现模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// 所有候选类都是 Bean
    #[default]
    All,
    /// 只有带 Bean 定义注解的候选类是 Bean
    Annotated,
    /// 不发现任何 Bean
    None,
}

/// `beans.toml` 描述符
///
/// ```toml
/// discovery_mode = "annotated"
/// alternatives = ["MockMailer"]
/// exclude = ["app::legacy::*"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeansDescriptor {
    /// 发现模式
    pub discovery_mode: DiscoveryMode,
    /// 启用的备选 Bean，可以是简短类型名或完整路径
    pub alternatives: Vec<String>,
    /// 排除的类型，glob 模式
    pub exclude: Vec<String>,
}

impl BeansDescriptor {
    /// 解析描述符内容
    pub fn parse(content: &str, location: &str) -> Result<Self, DefinitionError> {
        let descriptor: Self = toml::from_str(content).map_err(|e| DefinitionError::InvalidDescriptor {
            location: location.to_string(),
            message: e.to_string(),
        })?;

        for pattern in &descriptor.exclude {
            glob::Pattern::new(pattern).map_err(|e| DefinitionError::InvalidDescriptor {
                location: location.to_string(),
                message: format!("排除模式 {} 无效: {}", pattern, e),
            })?;
        }

        Ok(descriptor)
    }

    /// 类型是否被排除
    pub fn is_excluded(&self, type_info: &TypeInfo) -> bool {
        self.exclude.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&type_info.module_path) || p.matches(&type_info.name))
                .unwrap_or(false)
        })
    }

    /// 类型是否作为备选 Bean 启用
    pub fn enables_alternative(&self, type_info: &TypeInfo) -> bool {
        self.alternatives
            .iter()
            .any(|name| *name == type_info.name || *name == type_info.module_path)
    }
}

/// Bean 归档信息
///
/// 扫描完成后只读
#[derive(Debug, Clone)]
pub struct BeanArchiveInfo {
    id: String,
    descriptor_location: Option<String>,
    descriptor: BeansDescriptor,
    candidates: Vec<BeanClass>,
    problems: Vec<DefinitionError>,
}

impl BeanArchiveInfo {
    /// 创建没有描述符的归档
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            descriptor_location: None,
            descriptor: BeansDescriptor::default(),
            candidates: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// 设置描述符
    pub fn with_descriptor(mut self, location: impl Into<String>, descriptor: BeansDescriptor) -> Self {
        self.descriptor_location = Some(location.into());
        self.descriptor = descriptor;
        self
    }

    /// 添加候选类
    pub fn with_candidate(mut self, candidate: BeanClass) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// 添加多个候选类
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = BeanClass>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    /// 记录扫描时发现的问题
    pub fn with_problem(mut self, problem: DefinitionError) -> Self {
        self.problems.push(problem);
        self
    }

    /// 归档标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 描述符位置
    pub fn descriptor_location(&self) -> Option<&str> {
        self.descriptor_location.as_deref()
    }

    /// 描述符
    pub fn descriptor(&self) -> &BeansDescriptor {
        &self.descriptor
    }

    /// 全部候选类
    pub fn candidates(&self) -> &[BeanClass] {
        &self.candidates
    }

    /// 扫描问题
    pub fn problems(&self) -> &[DefinitionError] {
        &self.problems
    }

    /// 按发现模式和排除规则筛选后的候选类
    pub fn accepted_candidates(&self) -> Vec<BeanClass> {
        self.candidates
            .iter()
            .filter(|class| match self.descriptor.discovery_mode {
                DiscoveryMode::All => true,
                DiscoveryMode::Annotated => class.annotated_type().has_bean_defining_annotation(),
                DiscoveryMode::None => false,
            })
            .filter(|class| !self.descriptor.is_excluded(class.type_info()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::BeanScope;

    #[derive(Default)]
    struct Scoped;

    #[derive(Default)]
    struct Plain;

    mod legacy {
        #[derive(Default)]
        pub struct OldMailer;
    }

    fn archive(content: &str) -> BeanArchiveInfo {
        let descriptor = BeansDescriptor::parse(content, "beans.toml").unwrap();
        BeanArchiveInfo::new("app")
            .with_descriptor("beans.toml", descriptor)
            .with_candidate(
                BeanClass::builder::<Scoped>()
                    .scope(BeanScope::Application)
                    .default_constructor()
                    .build(),
            )
            .with_candidate(BeanClass::builder::<Plain>().default_constructor().build())
            .with_candidate(
                BeanClass::builder::<legacy::OldMailer>()
                    .scope(BeanScope::Singleton)
                    .default_constructor()
                    .build(),
            )
    }

    fn names(classes: Vec<BeanClass>) -> Vec<String> {
        classes.iter().map(|c| c.type_info().name.clone()).collect()
    }

    #[test]
    fn test_discovery_modes() {
        assert_eq!(names(archive("").accepted_candidates()).len(), 3);
        assert_eq!(
            names(archive("discovery_mode = \"annotated\"").accepted_candidates()),
            vec!["Scoped", "OldMailer"]
        );
        assert!(archive("discovery_mode = \"none\"")
            .accepted_candidates()
            .is_empty());
    }

    #[test]
    fn test_exclude_patterns() {
        let archive = archive("exclude = [\"*::legacy::*\"]");
        assert_eq!(names(archive.accepted_candidates()), vec!["Scoped", "Plain"]);
    }

    #[test]
    fn test_invalid_descriptor() {
        let error = BeansDescriptor::parse("discovery_mode = \"sometimes\"", "beans.toml").unwrap_err();
        assert!(matches!(error, DefinitionError::InvalidDescriptor { .. }));

        let error = BeansDescriptor::parse("exclude = [\"[\"]", "beans.toml").unwrap_err();
        assert!(matches!(error, DefinitionError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_alternatives_match_short_or_full_name() {
        let descriptor = BeansDescriptor::parse("alternatives = [\"Plain\"]", "beans.toml").unwrap();
        assert!(descriptor.enables_alternative(&TypeInfo::of::<Plain>()));
        assert!(!descriptor.enables_alternative(&TypeInfo::of::<Scoped>()));
    }
}
