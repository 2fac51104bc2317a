//! TOML 编解码器
//!
//! 解码时把 TOML 值规范化到与 JSON 一致的值模型，
//! 日期时间以字符串形式保留

use super::{Codec, CodecError};
use crate::value::{Mapping, Value};

/// TOML 编解码器实现
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        ::toml::to_string(&value.to_json())
            .map(String::into_bytes)
            .map_err(|e| CodecError::Marshal(e.to_string()))
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError> {
        let text =
            std::str::from_utf8(data).map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        let toml: ::toml::Value =
            ::toml::from_str(text).map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        Ok(from_toml(toml))
    }

    fn name(&self) -> &'static str {
        "toml"
    }
}

fn from_toml(toml: ::toml::Value) -> Value {
    match toml {
        ::toml::Value::String(s) => Value::Text(s),
        ::toml::Value::Integer(i) => Value::Int(i),
        ::toml::Value::Float(f) => Value::Float(f),
        ::toml::Value::Boolean(b) => Value::Bool(b),
        ::toml::Value::Datetime(dt) => Value::Text(dt.to_string()),
        ::toml::Value::Array(arr) => Value::Sequence(arr.into_iter().map(from_toml).collect()),
        ::toml::Value::Table(table) => {
            Value::Mapping(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}
