//! JSON 编解码器

use super::{Codec, CodecError};
use crate::value::Value;

/// JSON 编解码器实现
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(&value.to_json()).map_err(|e| CodecError::Marshal(e.to_string()))
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError> {
        let json: serde_json::Value =
            serde_json::from_slice(data).map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        Ok(Value::from_json(json))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Mapping;

    #[test]
    fn test_json_unmarshal() {
        let value = JsonCodec.unmarshal(br#"{"name":"alias","port":8080}"#).unwrap();
        let expected = Value::Mapping(Mapping::from([
            ("name".to_string(), Value::Text("alias".to_string())),
            ("port".to_string(), Value::Int(8080)),
        ]));
        assert_eq!(value, expected);
    }

    #[test]
    fn test_json_unmarshal_invalid() {
        assert!(JsonCodec.unmarshal(b"{not json").is_err());
    }

    #[test]
    fn test_json_marshal() {
        let value = Value::Mapping(Mapping::from([("a".to_string(), Value::Int(1))]));
        let data = JsonCodec.marshal(&value).unwrap();
        assert_eq!(data, br#"{"a":1}"#);
    }
}
