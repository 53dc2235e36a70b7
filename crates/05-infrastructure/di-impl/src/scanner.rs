//! 静态归档扫描器

use async_trait::async_trait;
use di_abstractions::{BeanArchiveInfo, BeanArchiveScanner, BeanClass, BeansDescriptor};
use infrastructure_common::DeploymentError;
use std::path::PathBuf;
use tracing::{debug, info};

/// 描述符来源
#[derive(Debug, Clone)]
enum DescriptorSource {
    None,
    File(PathBuf),
    Inline { location: String, content: String },
}

/// 静态归档扫描器
///
/// 候选 Bean 类在构建时给出；描述符可以来自文件或内联文本，文件只读取一次，不重试
#[derive(Debug)]
pub struct StaticArchiveScanner {
    name: String,
    archive_id: String,
    descriptor: DescriptorSource,
    candidates: Vec<BeanClass>,
}

impl StaticArchiveScanner {
    /// 创建扫描器
    pub fn new(archive_id: impl Into<String>) -> Self {
        let archive_id = archive_id.into();
        Self {
            name: format!("static:{}", archive_id),
            archive_id,
            descriptor: DescriptorSource::None,
            candidates: Vec::new(),
        }
    }

    /// 从文件读取 `beans.toml` 描述符，文件不存在时视为没有描述符
    pub fn with_descriptor_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor = DescriptorSource::File(path.into());
        self
    }

    /// 使用内联描述符
    pub fn with_descriptor(mut self, location: impl Into<String>, content: impl Into<String>) -> Self {
        self.descriptor = DescriptorSource::Inline {
            location: location.into(),
            content: content.into(),
        };
        self
    }

    /// 添加候选 Bean 类
    pub fn with_candidate(mut self, candidate: BeanClass) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// 添加多个候选 Bean 类
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = BeanClass>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    fn read_descriptor(&self) -> Result<Option<(String, String)>, DeploymentError> {
        match &self.descriptor {
            DescriptorSource::None => Ok(None),
            DescriptorSource::Inline { location, content } => Ok(Some((location.clone(), content.clone()))),
            DescriptorSource::File(path) => {
                let location = path.display().to_string();
                if !path.exists() {
                    debug!("描述符文件不存在，按无描述符处理: {}", location);
                    return Ok(None);
                }
                let content = std::fs::read_to_string(path).map_err(|e| DeploymentError::ScanFailed {
                    scanner: self.name.clone(),
                    message: format!("读取描述符 {} 失败: {}", location, e),
                })?;
                Ok(Some((location, content)))
            }
        }
    }
}

#[async_trait]
impl BeanArchiveScanner for StaticArchiveScanner {
    async fn scan(&self) -> Result<Vec<BeanArchiveInfo>, DeploymentError> {
        let mut archive = BeanArchiveInfo::new(self.archive_id.clone());

        if let Some((location, content)) = self.read_descriptor()? {
            match BeansDescriptor::parse(&content, &location) {
                Ok(descriptor) => {
                    debug!("解析描述符 {}: {:?}", location, descriptor);
                    archive = archive.with_descriptor(location, descriptor);
                }
                // 描述符错误属于定义错误，随其他定义错误一起报告
                Err(problem) => archive = archive.with_problem(problem),
            }
        }

        archive = archive.with_candidates(self.candidates.iter().cloned());
        info!(
            "扫描归档 {} 完成，候选类 {} 个",
            self.archive_id,
            archive.candidates().len()
        );
        Ok(vec![archive])
    }

    fn name(&self) -> &str {
        &self.name
    }
}
