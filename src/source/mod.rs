//! 配置源模块
//!
//! 定义配置片段和可插拔配置源的统一契约，
//! 内置文件源和内存源，远程配置中心等后端按同一契约外部实现

pub mod file;
pub mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 配置片段，来自某个配置源的一个原始配置单元
///
/// `format` 为空时表示 `key` 是点路径、`value` 是该路径下的原始值，
/// 非空时按格式名查找编解码器解码后并入根节点
#[derive(Debug, Clone)]
pub struct Fragment {
    /// 片段键，格式为空时按 `.` 拆分为嵌套路径
    pub key: String,
    /// 原始字节内容
    pub value: Vec<u8>,
    /// 格式标签，如 `json`、`yaml`，空表示原始值
    pub format: String,
}

impl Fragment {
    /// 创建配置片段
    pub fn new(
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            format: format.into(),
        }
    }
}

/// 配置源接口
///
/// 一次性全量拉取片段，并可创建变更监听器
#[async_trait]
pub trait Source: Send + Sync {
    /// 一次性全量拉取配置片段
    async fn load(&self) -> Result<Vec<Fragment>>;

    /// 创建该源的变更监听器
    async fn watch(&self) -> Result<Arc<dyn Watcher>>;
}

/// 配置变更监听器接口
#[async_trait]
pub trait Watcher: Send + Sync {
    /// 阻塞等待下一批配置片段
    ///
    /// # 返回
    /// * `Ok(fragments)` - 新的片段批次
    /// * `Err(ConfigError::Canceled)` - 监听器已被停止
    async fn next(&self) -> Result<Vec<Fragment>>;

    /// 停止监听，幂等，会解除未完成的 `next` 阻塞
    async fn stop(&self) -> Result<()>;
}
