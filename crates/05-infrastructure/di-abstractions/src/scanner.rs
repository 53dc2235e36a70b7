//! Bean 归档扫描器抽象接口

use crate::discovery::BeanArchiveInfo;
use async_trait::async_trait;
use infrastructure_common::DeploymentError;

/// Bean 归档扫描器 trait
///
/// 定位描述符资源并提供候选 Bean 类，Bean 管理器初始化时依次调用
#[async_trait]
pub trait BeanArchiveScanner: Send + Sync {
    /// 扫描归档
    async fn scan(&self) -> Result<Vec<BeanArchiveInfo>, DeploymentError>;

    /// 获取扫描器名称
    fn name(&self) -> &str;
}
