//! 元数据定义
//!
//! 提供类型的元数据信息

use std::any::TypeId;
use std::fmt;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 创建新的类型信息
    pub fn new(type_id: TypeId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            module_path: name.clone(),
            name,
            id: type_id,
        }
    }

    /// 从类型获取类型信息，支持 trait object
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full_name = std::any::type_name::<T>();
        Self {
            name: short_type_name(full_name),
            id: TypeId::of::<T>(),
            module_path: full_name.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// 检查是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 去掉模块路径，保留泛型参数的简短名称
///
/// `alloc::sync::Arc<app::Repo>` -> `Arc<Repo>`，`dyn app::Service` -> `dyn Service`
fn short_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut segment = String::new();

    for ch in full_name.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                result.push_str(&segment);
                segment.clear();
                result.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    result.push_str(&segment);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeting {}

    #[test]
    fn test_short_names() {
        assert_eq!(TypeInfo::of::<String>().short_name(), "String");
        assert_eq!(TypeInfo::of::<dyn Greeting>().short_name(), "dyn Greeting");
        assert_eq!(
            TypeInfo::of::<std::sync::Arc<Vec<String>>>().short_name(),
            "Arc<Vec<String>>"
        );
    }

    #[test]
    fn test_type_identity() {
        let info = TypeInfo::of::<u32>();
        assert!(info.is::<u32>());
        assert!(!info.is::<u64>());
        assert_eq!(info, TypeInfo::of::<u32>());
    }
}
