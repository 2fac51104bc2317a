//! DynConf - 动态配置引擎
//!
//! 这是一个用Rust编写的动态配置引擎，支持：
//! - 多配置源聚合与有序覆盖合并
//! - JSON/YAML/XML/TOML/表单等多格式片段解码
//! - `${path:default}` 占位符自引用解析
//! - 点路径查询与无锁热更新单元格
//! - 配置源变更监听与按路径的精确变更通知

pub mod cell;
pub mod codec;
pub mod error;
pub mod logging;
pub mod manager;
pub mod source;
pub mod store;
pub mod value;

// 重新导出主要类型
pub use cell::Cell;
pub use codec::{Codec, CodecError, CodecRegistry};
pub use error::{ConfigError, Result};
pub use manager::{ConfigManager, Observer};
pub use source::{FileSource, Fragment, MemorySource, Source, Watcher};
pub use store::{Store, StoreState};
pub use value::{Mapping, Value};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
