//! URL 表单编解码器
//!
//! 解码为扁平的字符串映射，同名键后值覆盖前值

use super::{Codec, CodecError};
use crate::value::{Mapping, Value};

/// URL 表单编解码器实现
pub struct FormCodec;

impl Codec for FormCodec {
    fn marshal(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let map = value
            .as_mapping()
            .ok_or_else(|| CodecError::Marshal("表单编码要求顶层为映射".to_string()))?;
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, item) in map {
            match item {
                Value::Sequence(_) | Value::Mapping(_) => {
                    return Err(CodecError::Marshal(format!("表单编码不支持嵌套值: {}", key)));
                }
                scalar => {
                    serializer.append_pair(key, &scalar.repr());
                }
            }
        }
        Ok(serializer.finish().into_bytes())
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Value, CodecError> {
        let mut map = Mapping::new();
        for (key, value) in form_urlencoded::parse(data) {
            map.insert(key.into_owned(), Value::Text(value.into_owned()));
        }
        Ok(Value::Mapping(map))
    }

    fn name(&self) -> &'static str {
        "x-www-form-urlencoded"
    }
}
