//! 错误处理模块
//!
//! 定义配置引擎的统一错误类型

use thiserror::Error;

/// 配置引擎的主要错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 路径在配置树中不存在
    #[error("配置路径不存在: {path}")]
    NotFound { path: String },

    /// 片段格式没有注册对应的编解码器
    #[error("不支持的配置格式: key={key} format={format}")]
    UnsupportedFormat { key: String, format: String },

    /// 片段解码失败
    #[error("配置片段解码失败: key={key}: {reason}")]
    Decode { key: String, reason: String },

    /// 合并失败，整个合并调用中止，配置树保持不变
    #[error("配置合并失败: {0}")]
    Merge(String),

    /// 占位符解析失败，配置树停留在已合并未解析状态
    #[error("占位符解析失败: {0}")]
    Resolve(String),

    /// 引擎已关闭后的操作
    #[error("配置引擎已关闭")]
    Closed,

    /// 监听器已被停止
    #[error("配置监听已取消")]
    Canceled,

    /// 文件系统监控错误
    #[error("文件监控错误: {0}")]
    Watch(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ConfigError>;
