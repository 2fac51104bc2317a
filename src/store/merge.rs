//! 深度合并
//!
//! 把映射片段按覆盖语义并入配置树的副本。
//! 调用方先对当前树做结构化深拷贝，保证持有旧树引用的
//! 读者不会观察到合并中途的状态

use crate::value::{Mapping, Value};
use std::collections::btree_map::Entry;

/// 深度合并片段映射到目标映射
///
/// 双方均为映射时递归合并，否则片段侧的值覆盖现有值。
/// 同一次调用中后一个片段覆盖前一个片段设置的路径
pub fn deep_merge(current: &mut Mapping, fragment: Mapping) {
    for (key, incoming) in fragment {
        match current.entry(key) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                match (existing, incoming) {
                    (Value::Mapping(cur), Value::Mapping(inc)) => deep_merge(cur, inc),
                    (existing, other) => *existing = other,
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(incoming);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, Value)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_disjoint_keys() {
        let mut tree = mapping(&[("a", Value::Int(1))]);
        deep_merge(&mut tree, mapping(&[("b", Value::Int(2))]));
        assert_eq!(tree, mapping(&[("a", Value::Int(1)), ("b", Value::Int(2))]));
    }

    #[test]
    fn test_merge_override_scalar() {
        let mut tree = mapping(&[("p", Value::Int(1))]);
        deep_merge(&mut tree, mapping(&[("p", Value::Int(2))]));
        assert_eq!(tree, mapping(&[("p", Value::Int(2))]));
    }

    #[test]
    fn test_merge_nested_mappings_recurse() {
        let mut tree = mapping(&[(
            "server",
            Value::Mapping(mapping(&[
                ("host", Value::Text("localhost".to_string())),
                ("port", Value::Int(80)),
            ])),
        )]);
        deep_merge(
            &mut tree,
            mapping(&[("server", Value::Mapping(mapping(&[("port", Value::Int(8080))])))]),
        );
        assert_eq!(
            tree,
            mapping(&[(
                "server",
                Value::Mapping(mapping(&[
                    ("host", Value::Text("localhost".to_string())),
                    ("port", Value::Int(8080)),
                ])),
            )])
        );
    }

    #[test]
    fn test_merge_mapping_replaces_scalar() {
        let mut tree = mapping(&[("a", Value::Int(1))]);
        deep_merge(
            &mut tree,
            mapping(&[("a", Value::Mapping(mapping(&[("b", Value::Int(2))])))]),
        );
        assert!(matches!(tree.get("a"), Some(Value::Mapping(_))));
    }

    #[test]
    fn test_merge_scalar_replaces_mapping() {
        let mut tree = mapping(&[("a", Value::Mapping(mapping(&[("b", Value::Int(2))])))]);
        deep_merge(&mut tree, mapping(&[("a", Value::Int(1))]));
        assert_eq!(tree.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_merge_order_associative_for_disjoint_fragments() {
        // 先 [f1, f2] 再 [f3] 与一次性合并 [f1, f2, f3] 结果一致
        let f1 = mapping(&[("a", Value::Int(1))]);
        let f2 = mapping(&[("b", Value::Int(2))]);
        let f3 = mapping(&[("c", Value::Int(3))]);

        let mut staged = Mapping::new();
        deep_merge(&mut staged, f1.clone());
        deep_merge(&mut staged, f2.clone());
        deep_merge(&mut staged, f3.clone());

        let mut at_once = Mapping::new();
        for f in [f1, f2, f3] {
            deep_merge(&mut at_once, f);
        }
        assert_eq!(staged, at_once);
    }
}
