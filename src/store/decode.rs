//! 片段解码
//!
//! 将原始配置片段转换为可合并的映射片段

use crate::codec::CodecRegistry;
use crate::error::{ConfigError, Result};
use crate::source::Fragment;
use crate::value::{Mapping, Value};

/// 解码单个配置片段
///
/// 格式为空时把 `key` 按 `.` 拆分为嵌套路径，原始字节作为叶子；
/// 否则按格式名查找编解码器，解码结果并入根节点
pub fn decode_fragment(registry: &CodecRegistry, fragment: &Fragment) -> Result<Mapping> {
    if fragment.format.is_empty() {
        if fragment.key.is_empty() {
            return Err(ConfigError::Decode {
                key: fragment.key.clone(),
                reason: "片段键为空".to_string(),
            });
        }
        let mut segments = fragment.key.rsplit('.');
        let leaf = segments.next().unwrap_or_default();
        let mut map = Mapping::from([(leaf.to_string(), Value::Bytes(fragment.value.clone()))]);
        for key in segments {
            map = Mapping::from([(key.to_string(), Value::Mapping(map))]);
        }
        return Ok(map);
    }

    let codec = registry
        .get(&fragment.format)
        .ok_or_else(|| ConfigError::UnsupportedFormat {
            key: fragment.key.clone(),
            format: fragment.format.clone(),
        })?;

    let value = codec
        .unmarshal(&fragment.value)
        .map_err(|e| ConfigError::Decode {
            key: fragment.key.clone(),
            reason: e.to_string(),
        })?;

    match value {
        Value::Mapping(map) => Ok(map),
        other => Err(ConfigError::Decode {
            key: fragment.key.clone(),
            reason: format!("片段顶层不是映射: {:?}", other),
        }),
    }
}
