//! YAML 编解码器
//!
//! YAML 允许非字符串键，解码时统一规范化为字符串键，
//! 与其余格式共享同一套值模型

use super::{Codec, CodecError};
use crate::value::{Mapping, Value};

/// YAML 编解码器实现
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(&value.to_json())
            .map(String::into_bytes)
            .map_err(|e| CodecError::Marshal(e.to_string()))
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_slice(data).map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        Ok(from_yaml(yaml))
    }

    fn name(&self) -> &'static str {
        "yaml"
    }
}

/// 将 YAML 值转换为配置值，键一律转为字符串
fn from_yaml(yaml: serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Text(String::new()),
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_yaml::Value::String(s) => Value::Text(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Sequence(seq.into_iter().map(from_yaml).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, value) in map {
                out.insert(yaml_key(key), from_yaml(value));
            }
            Value::Mapping(out)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

/// YAML 键的字符串表示
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => from_yaml(other).repr(),
    }
}
