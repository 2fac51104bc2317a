//! 配置单元格模块
//!
//! 提供单个配置路径上的线程安全值容器，读路径无锁，
//! 更新时原子替换内部值而不替换容器本身

use crate::value::Value;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// 配置单元格
///
/// 首次查询某个点路径成功后创建并被缓存，后续配置更新只替换
/// 其内部槽位，因此调用方持有的旧引用能持续观察到最新值
pub struct Cell {
    slot: ArcSwap<Value>,
}

impl Cell {
    /// 用初始值创建单元格
    pub(crate) fn new(value: Value) -> Self {
        Self {
            slot: ArcSwap::from_pointee(value),
        }
    }

    /// 读取当前值，无锁
    pub fn get(&self) -> Arc<Value> {
        self.slot.load_full()
    }

    /// 原子替换内部值
    pub(crate) fn store(&self, value: Value) {
        self.slot.store(Arc::new(value));
    }

    /// 当前值的规范字符串表示
    pub fn repr(&self) -> String {
        self.get().repr()
    }

    /// 弱类型布尔读取
    pub fn as_bool(&self) -> bool {
        self.get().as_bool()
    }

    /// 弱类型整数读取
    pub fn as_int(&self) -> i64 {
        self.get().as_int()
    }

    /// 弱类型浮点读取
    pub fn as_float(&self) -> f64 {
        self.get().as_float()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell").field(&*self.get()).finish()
    }
}
