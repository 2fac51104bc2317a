//! 日志系统模块
//!
//! 提供结构化日志的一次性初始化，桥接 `log` 宏到 `tracing`

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// 全局日志初始化状态
static GLOBAL_LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// 初始化全局日志订阅器，幂等
///
/// # 参数
/// * `default_level` - 默认日志级别，可被 `RUST_LOG` 环境变量覆盖
pub fn init_logging(default_level: &str) {
    GLOBAL_LOGGING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

        // log 宏桥接到 tracing，重复初始化时忽略错误
        let _ = tracing_log::LogTracer::init();
        let _ = registry().with(filter).with(fmt::layer()).try_init();
    });
}
