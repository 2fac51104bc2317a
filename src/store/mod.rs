//! 配置存储模块
//!
//! 持有权威配置树，在互斥锁保护下执行解码→合并→解析流水线，
//! 并提供点路径查询和整树序列化

pub mod decode;
pub mod merge;
pub mod path;
pub mod resolve;

use crate::codec::CodecRegistry;
use crate::error::{ConfigError, Result};
use crate::source::Fragment;
use crate::value::{Mapping, Value};
use parking_lot::Mutex;
use tracing::error;

/// 存储状态机：空 → 已加载 → 已更新 → 已关闭
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// 尚未成功合并过任何片段
    Empty,
    /// 首次合并完成
    Loaded,
    /// 发生过后续更新
    Updated,
    /// 已关闭，所有操作返回 [`ConfigError::Closed`]
    Closed,
}

struct StoreInner {
    tree: Mapping,
    state: StoreState,
}

/// 配置存储
///
/// 锁只在单次操作期间持有，绝不跨越阻塞等待；
/// 合并在当前树的深拷贝上进行，最后整树原子替换，
/// 持有旧树派生值的读者不会观察到合并中途的状态
pub struct Store {
    registry: CodecRegistry,
    inner: Mutex<StoreInner>,
}

impl Store {
    /// 用给定编解码器注册表创建空存储
    pub fn new(registry: CodecRegistry) -> Self {
        Self {
            registry,
            inner: Mutex::new(StoreInner {
                tree: Mapping::new(),
                state: StoreState::Empty,
            }),
        }
    }

    /// 解码并合并一批配置片段
    ///
    /// 单个片段解码失败只丢弃该片段，其余片段继续处理；
    /// 片段按传入顺序依次合并，后者覆盖前者
    pub fn merge(&self, fragments: &[Fragment]) -> Result<()> {
        let mut merged = {
            let inner = self.inner.lock();
            if inner.state == StoreState::Closed {
                return Err(ConfigError::Closed);
            }
            inner.tree.clone()
        };

        for fragment in fragments {
            match decode::decode_fragment(&self.registry, fragment) {
                Ok(map) => {
                    // 合并前规范化，字节叶子统一转为字符串
                    let mut value = Value::Mapping(map);
                    value.normalize();
                    if let Value::Mapping(map) = value {
                        merge::deep_merge(&mut merged, map);
                    }
                }
                Err(e) => {
                    error!("配置片段解码失败，已跳过: key={} error={}", fragment.key, e);
                    continue;
                }
            }
        }

        let mut inner = self.inner.lock();
        if inner.state == StoreState::Closed {
            return Err(ConfigError::Closed);
        }
        inner.tree = merged;
        inner.state = match inner.state {
            StoreState::Empty => StoreState::Loaded,
            _ => StoreState::Updated,
        };
        Ok(())
    }

    /// 就地解析当前树中的占位符
    pub fn resolve(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == StoreState::Closed {
            return Err(ConfigError::Closed);
        }
        resolve::resolve_tree(&mut inner.tree)
    }

    /// 按点路径查询，未命中返回 `Ok(None)`
    pub fn value(&self, path: &str) -> Result<Option<Value>> {
        let inner = self.inner.lock();
        if inner.state == StoreState::Closed {
            return Err(ConfigError::Closed);
        }
        Ok(path::read_value(&inner.tree, path))
    }

    /// 整树序列化为规范 JSON 字节
    pub fn source(&self) -> Result<Vec<u8>> {
        let json = {
            let inner = self.inner.lock();
            if inner.state == StoreState::Closed {
                return Err(ConfigError::Closed);
            }
            serde_json::Value::Object(
                inner
                    .tree
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            )
        };
        Ok(serde_json::to_vec(&json)?)
    }

    /// 当前状态
    pub fn state(&self) -> StoreState {
        self.inner.lock().state
    }

    /// 关闭存储，后续所有操作失败
    pub fn close(&self) {
        self.inner.lock().state = StoreState::Closed;
    }
}
