//! Bean 解析抽象接口
//!
//! 提供注入点解析和创建过程中的循环检测

use crate::bean::BeanId;
use crate::factory::CreationalContext;
use crate::injection::{BeanInstance, InjectionPoint};
use infrastructure_common::CreationError;

/// 注入点解析器
///
/// 由 Bean 管理器实现，注入目标通过创建上下文回调它来获取依赖实例
pub trait BeanResolver: Send + Sync {
    /// 解析注入点，返回已转换为所需类型的实例
    fn resolve_injection_point(
        &self,
        point: &InjectionPoint,
        ctx: &mut CreationalContext,
    ) -> Result<BeanInstance, CreationError>;
}

/// 解析上下文
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 当前创建链，用于检测循环依赖
    chain: Vec<(BeanId, String)>,
    /// 最大递归深度
    max_depth: usize,
    /// 是否检测循环依赖
    detect_cycles: bool,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(max_depth: usize) -> Self {
        Self {
            chain: Vec::new(),
            max_depth,
            detect_cycles: true,
        }
    }

    /// 设置是否检测循环依赖
    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    /// 将 Bean 加入创建链
    pub fn push(&mut self, bean: BeanId, name: impl Into<String>) -> Result<(), CreationError> {
        let name = name.into();
        if self.detect_cycles && self.chain.iter().any(|(id, _)| *id == bean) {
            return Err(CreationError::CircularCreation {
                chain: format!("{} -> {}", self.describe(), name),
            });
        }
        if self.chain.len() >= self.max_depth {
            return Err(CreationError::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        self.chain.push((bean, name));
        Ok(())
    }

    /// 从创建链中移除最后一个 Bean
    pub fn pop(&mut self) {
        self.chain.pop();
    }

    /// 当前深度
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// 创建链描述
    pub fn describe(&self) -> String {
        self.chain
            .iter()
            .map(|(_, name)| name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_in_creation_chain() {
        let mut ctx = ResolveContext::default();
        ctx.push(BeanId(1), "Order").unwrap();
        ctx.push(BeanId(2), "Payment").unwrap();

        match ctx.push(BeanId(1), "Order") {
            Err(CreationError::CircularCreation { chain }) => {
                assert_eq!(chain, "Order -> Payment -> Order");
            }
            other => panic!("期望循环依赖错误，实际: {:?}", other),
        }

        ctx.pop();
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_max_depth() {
        let mut ctx = ResolveContext::new(2).with_cycle_detection(false);
        ctx.push(BeanId(1), "A").unwrap();
        ctx.push(BeanId(1), "A").unwrap();
        assert!(matches!(
            ctx.push(BeanId(1), "A"),
            Err(CreationError::MaxDepthExceeded { max_depth: 2 })
        ));
    }
}
