//! XML 编解码器
//!
//! XML 元素文本均解码为字符串，数值转换交由弱类型转换处理

use super::{Codec, CodecError};
use crate::value::Value;

/// XML 编解码器实现
pub struct XmlCodec;

impl Codec for XmlCodec {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        quick_xml::se::to_string_with_root("config", &value.to_json())
            .map(String::into_bytes)
            .map_err(|e| CodecError::Marshal(e.to_string()))
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError> {
        let text =
            std::str::from_utf8(data).map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        let json: serde_json::Value =
            quick_xml::de::from_str(text).map_err(|e| CodecError::Unmarshal(e.to_string()))?;
        Ok(Value::from_json(json))
    }

    fn name(&self) -> &'static str {
        "xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_unmarshal() {
        let value = XmlCodec
            .unmarshal(b"<config><name>alias</name></config>")
            .unwrap();
        let map = value.as_mapping().unwrap();
        assert_eq!(map.get("name"), Some(&Value::Text("alias".to_string())));
    }

    #[test]
    fn test_xml_unmarshal_invalid() {
        assert!(XmlCodec.unmarshal(b"<config><broken>").is_err());
    }
}
