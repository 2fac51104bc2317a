//! 占位符解析
//!
//! 对配置树做前序遍历，展开字符串叶子中的 `${path[:default]}`
//! 引用。查找基于解析前的整树快照，因此前向引用可以命中，
//! 而展开结果本身不会被再次扫描（单趟展开）

use crate::error::Result;
use crate::store::path::read_value;
use crate::value::{Mapping, Value};
use regex::Regex;
use std::sync::OnceLock;

/// 占位符模式，仅匹配不含花括号的引用；
/// 未闭合的 `${...` 和外层嵌套模式因此原样保留
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^{}]*)\}").expect("占位符正则非法"))
}

/// 就地解析整棵配置树中的占位符
pub fn resolve_tree(tree: &mut Mapping) -> Result<()> {
    let snapshot = tree.clone();
    resolve_mapping(tree, &snapshot);
    Ok(())
}

fn resolve_mapping(map: &mut Mapping, snapshot: &Mapping) {
    for value in map.values_mut() {
        match value {
            Value::Text(s) => {
                *s = expand(s, |name| resolve_ref(snapshot, name));
            }
            Value::Mapping(nested) => resolve_mapping(nested, snapshot),
            Value::Sequence(seq) => {
                for item in seq.iter_mut() {
                    match item {
                        Value::Text(s) => {
                            *s = expand(s, |name| resolve_ref(snapshot, name));
                        }
                        Value::Mapping(nested) => resolve_mapping(nested, snapshot),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// 展开字符串中的所有占位符
///
/// 每个占位符独立展开一次，替换结果不再重新扫描
pub fn expand(input: &str, mapper: impl Fn(&str) -> String) -> String {
    placeholder_re()
        .replace_all(input, |caps: &regex::Captures| mapper(&caps[1]))
        .into_owned()
}

/// 解析单个引用 `path[:default]`
///
/// 命中时返回规范字符串表示；未命中且带默认值时返回默认值字面量；
/// 否则返回空字符串
fn resolve_ref(snapshot: &Mapping, reference: &str) -> String {
    let mut parts = reference.trim().splitn(2, ':');
    let path = parts.next().unwrap_or_default();
    if let Some(value) = read_value(snapshot, path) {
        value.repr()
    } else if let Some(default) = parts.next() {
        default.to_string()
    } else {
        String::new()
    }
}
