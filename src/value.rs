//! 配置值类型定义
//!
//! 以封闭的标签联合类型表示配置树，替代松散的动态类型，
//! 并提供弱类型场景下的规范字符串表示和类型转换

use std::collections::BTreeMap;
use std::mem;

/// 嵌套映射类型，配置树的根始终是一个 Mapping
pub type Mapping = BTreeMap<String, Value>;

/// 配置值，标量、序列或嵌套映射
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 布尔值
    Bool(bool),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    Text(String),
    /// 原始字节（合并前会被规范化为字符串，配置数据中不应出现二进制值）
    Bytes(Vec<u8>),
    /// 有序序列
    Sequence(Vec<Value>),
    /// 嵌套映射
    Mapping(Mapping),
}

impl Value {
    /// 判断两个值的动态类型是否一致
    ///
    /// 变更通知要求新旧值类型一致，类型变化被视为"无变更"
    pub fn same_type(&self, other: &Value) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// 值的规范字符串表示
    ///
    /// 占位符替换时使用：布尔输出 `true`/`false`，整数无小数部分，
    /// 浮点数使用最短十进制表示，字符串原样输出
    pub fn repr(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{}", f),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Sequence(_) | Value::Mapping(_) => {
                serde_json::to_string(&self.to_json()).unwrap_or_default()
            }
        }
    }

    /// 弱类型布尔转换，字符串按字面量解析，失败返回 false
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i == 1,
            Value::Float(f) => *f == 1.0,
            Value::Text(s) => matches!(s.as_str(), "1" | "t" | "T" | "true" | "TRUE" | "True"),
            _ => false,
        }
    }

    /// 弱类型整数转换，字符串按十进制解析，失败返回 0
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Text(s) => s.parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// 弱类型浮点转换，字符串按十进制解析，失败返回 0.0
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Text(s) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// 若为字符串则返回其内容
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// 若为映射则返回其引用
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// 递归地将字节值规范化为字符串
    ///
    /// 合并前调用，保证合并后的树中不存在原始字节叶子
    pub fn normalize(&mut self) {
        match self {
            Value::Bytes(b) => {
                let text = String::from_utf8_lossy(b).into_owned();
                *self = Value::Text(text);
            }
            Value::Sequence(seq) => {
                for item in seq.iter_mut() {
                    item.normalize();
                }
            }
            Value::Mapping(map) => {
                for item in map.values_mut() {
                    item.normalize();
                }
            }
            _ => {}
        }
    }

    /// 从 JSON 中间模型构建配置值
    ///
    /// 各编解码器统一解码到 `serde_json::Value` 后经此转换，
    /// null 归一化为空字符串
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Text(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(arr) => {
                Value::Sequence(arr.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::Mapping(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// 转换为 JSON 中间模型，用于整树序列化和编解码器编码
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Value::Sequence(seq) => {
                serde_json::Value::Array(seq.iter().map(Value::to_json).collect())
            }
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}
