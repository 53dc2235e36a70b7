//! 部署校验
//!
//! 检查注入点是否可以唯一解析、作用域依赖是否合法，并在依赖图上检测循环依赖

use crate::registry::BeanRegistry;
use di_abstractions::{format_qualifiers, BeanId, ContainerConfig};
use infrastructure_common::{DefinitionError, ResolutionError};
use std::collections::{BTreeMap, HashSet};

/// Bean 依赖关系图
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// 节点名称
    nodes: BTreeMap<BeanId, String>,
    /// 邻接表
    adjacency_list: BTreeMap<BeanId, Vec<BeanId>>,
}

impl DependencyGraph {
    /// 创建新的依赖关系图
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加节点
    pub fn add_bean(&mut self, bean: BeanId, name: impl Into<String>) {
        self.nodes.insert(bean, name.into());
    }

    /// 添加依赖关系
    pub fn add_dependency(&mut self, dependent: BeanId, dependency: BeanId) {
        let dependencies = self.adjacency_list.entry(dependent).or_default();
        if !dependencies.contains(&dependency) {
            dependencies.push(dependency);
        }
    }

    /// 获取直接依赖
    pub fn get_dependencies(&self, bean: BeanId) -> &[BeanId] {
        self.adjacency_list
            .get(&bean)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 检测循环依赖，返回找到的每个环
    pub fn detect_circular_dependencies(&self) -> Result<(), Vec<Vec<BeanId>>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut cycles = Vec::new();

        for node in self.nodes.keys() {
            if !visited.contains(node) {
                let mut path = Vec::new();
                self.dfs_detect_cycle(*node, &mut visited, &mut rec_stack, &mut path, &mut cycles);
            }
        }

        if cycles.is_empty() {
            Ok(())
        } else {
            Err(cycles)
        }
    }

    fn dfs_detect_cycle(
        &self,
        node: BeanId,
        visited: &mut HashSet<BeanId>,
        rec_stack: &mut HashSet<BeanId>,
        path: &mut Vec<BeanId>,
        cycles: &mut Vec<Vec<BeanId>>,
    ) {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for dep in self.get_dependencies(node) {
            if rec_stack.contains(dep) {
                if let Some(cycle_start) = path.iter().position(|n| n == dep) {
                    cycles.push(path[cycle_start..].to_vec());
                }
            } else if !visited.contains(dep) {
                self.dfs_detect_cycle(*dep, visited, rec_stack, path, cycles);
            }
        }

        path.pop();
        rec_stack.remove(&node);
    }

    /// 环的描述，首尾相接
    pub fn describe_cycle(&self, cycle: &[BeanId]) -> String {
        let mut names: Vec<&str> = cycle
            .iter()
            .map(|id| self.nodes.get(id).map(String::as_str).unwrap_or("?"))
            .collect();
        if let Some(first) = names.first().copied() {
            names.push(first);
        }
        names.join(" -> ")
    }
}

/// 校验已注册的 Bean，返回发现的定义错误
pub fn validate_deployment(registry: &BeanRegistry, config: &ContainerConfig) -> Vec<DefinitionError> {
    let mut errors = Vec::new();
    let mut graph = DependencyGraph::new();

    for registered in registry.all() {
        let bean = registered.bean();
        if !registry.is_enabled(bean) {
            continue;
        }
        graph.add_bean(bean.id(), bean.to_string());

        for point in bean.injection_points() {
            match registry.resolve(point.required_type(), point.qualifiers()) {
                Ok(dependency) => {
                    let dependency = dependency.bean();
                    graph.add_dependency(bean.id(), dependency.id());

                    if config.validate_injection_points
                        && bean.scope().is_container_bound()
                        && dependency.scope().is_context_bound()
                    {
                        errors.push(DefinitionError::IllegalScopeDependency {
                            bean: bean.to_string(),
                            bean_scope: bean.scope().to_string(),
                            dependency: dependency.to_string(),
                            dependency_scope: dependency.scope().to_string(),
                        });
                    }
                }
                Err(_) if !config.validate_injection_points => {}
                Err(ResolutionError::Unsatisfied { .. }) => {
                    errors.push(DefinitionError::UnsatisfiedDependency {
                        injection_point: point.to_string(),
                        required_type: point.required_type().to_string(),
                        qualifiers: format_qualifiers(point.qualifiers()),
                    });
                }
                Err(ResolutionError::Ambiguous { candidates, .. }) => {
                    errors.push(DefinitionError::AmbiguousDependency {
                        injection_point: point.to_string(),
                        required_type: point.required_type().to_string(),
                        candidates,
                    });
                }
            }
        }
    }

    if config.enable_circular_dependency_detection {
        if let Err(cycles) = graph.detect_circular_dependencies() {
            for cycle in cycles {
                errors.push(DefinitionError::CircularDependency {
                    chain: graph.describe_cycle(&cycle),
                });
            }
        }
    }

    errors
}
