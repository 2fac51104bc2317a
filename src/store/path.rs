//! 点路径读取
//!
//! 将点分路径逐层解析到配置树中的叶子值

use crate::value::{Mapping, Value};

/// 按点分路径读取配置树中的值
///
/// 中间段缺失或不是映射、末段缺失时返回 `None`，
/// 命中时返回叶子值的克隆
pub fn read_value(tree: &Mapping, path: &str) -> Option<Value> {
    let keys: Vec<&str> = path.split('.').collect();
    let last = keys.len() - 1;
    let mut current = tree;
    for (idx, key) in keys.iter().enumerate() {
        let value = current.get(*key)?;
        if idx == last {
            return Some(value.clone());
        }
        current = value.as_mapping()?;
    }
    None
}
