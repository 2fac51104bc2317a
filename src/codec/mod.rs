//! 编解码器模块
//!
//! 定义配置片段的编解码接口和显式的编解码器注册表。
//! 注册表由解码流程持有并在构造时填充，不依赖进程级全局状态

pub mod form;
pub mod json;
pub mod toml;
pub mod xml;
pub mod yaml;

pub use self::form::FormCodec;
pub use self::json::JsonCodec;
pub use self::toml::TomlCodec;
pub use self::xml::XmlCodec;
pub use self::yaml::YamlCodec;

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// 编解码错误
#[derive(Error, Debug)]
pub enum CodecError {
    /// 编码失败
    #[error("编码失败: {0}")]
    Marshal(String),

    /// 解码失败
    #[error("解码失败: {0}")]
    Unmarshal(String),
}

/// 编解码器接口
///
/// 各实现统一以 [`Value`] 作为内存模型，实现必须线程安全
pub trait Codec: Send + Sync {
    /// 将配置值编码为字节
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// 将字节解码为配置值
    fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError>;

    /// 编解码器名称，作为格式标签使用，必须是静态的
    fn name(&self) -> &'static str;
}

/// 编解码器注册表
///
/// 按小写格式名查找编解码器
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// 创建带默认编解码器的注册表
    ///
    /// 预置 json、yaml（含 yml 别名）、xml、toml 和表单编码
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonCodec));
        registry.register(Arc::new(YamlCodec));
        registry.register_as("yml", Arc::new(YamlCodec));
        registry.register(Arc::new(XmlCodec));
        registry.register(Arc::new(TomlCodec));
        registry.register(Arc::new(FormCodec));
        registry
    }

    /// 按编解码器自述名称注册
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        let name = codec.name().to_lowercase();
        self.codecs.insert(name, codec);
    }

    /// 以别名注册
    pub fn register_as(&mut self, name: &str, codec: Arc<dyn Codec>) {
        self.codecs.insert(name.to_lowercase(), codec);
    }

    /// 按格式名查找，格式名不区分大小写
    pub fn get(&self, format: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.get(&format.to_lowercase()).cloned()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
