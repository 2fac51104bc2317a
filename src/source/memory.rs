//! 内存配置源
//!
//! 初始片段固定，变更通过 `push` 推送给所有监听器，
//! 主要用于测试和示例

use crate::error::{ConfigError, Result};
use crate::source::{Fragment, Source, Watcher};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// 内存配置源
pub struct MemorySource {
    fragments: Vec<Fragment>,
    push_tx: broadcast::Sender<Vec<Fragment>>,
}

impl MemorySource {
    /// 用初始片段创建内存源
    pub fn new(fragments: Vec<Fragment>) -> Self {
        let (push_tx, _) = broadcast::channel(16);
        Self { fragments, push_tx }
    }

    /// 推送一批新片段，唤醒所有阻塞中的监听器
    pub fn push(&self, fragments: Vec<Fragment>) {
        let _ = self.push_tx.send(fragments);
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn load(&self) -> Result<Vec<Fragment>> {
        Ok(self.fragments.clone())
    }

    async fn watch(&self) -> Result<Arc<dyn Watcher>> {
        let (stop_tx, stop_rx) = broadcast::channel(1);
        Ok(Arc::new(MemoryWatcher {
            push_rx: Mutex::new(self.push_tx.subscribe()),
            stop_rx: Mutex::new(stop_rx),
            stop_tx,
            stopped: AtomicBool::new(false),
        }))
    }
}

/// 内存源监听器
pub struct MemoryWatcher {
    push_rx: Mutex<broadcast::Receiver<Vec<Fragment>>>,
    stop_rx: Mutex<broadcast::Receiver<()>>,
    stop_tx: broadcast::Sender<()>,
    stopped: AtomicBool,
}

#[async_trait]
impl Watcher for MemoryWatcher {
    async fn next(&self) -> Result<Vec<Fragment>> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ConfigError::Canceled);
        }
        let mut stop_rx = self.stop_rx.lock().await;
        let mut push_rx = self.push_rx.lock().await;
        loop {
            tokio::select! {
                _ = stop_rx.recv() => return Err(ConfigError::Canceled),
                received = push_rx.recv() => match received {
                    Ok(fragments) => return Ok(fragments),
                    Err(broadcast::error::RecvError::Closed) => return Err(ConfigError::Canceled),
                    // 积压被丢弃时继续等待下一批
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                },
            }
        }
    }

    async fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let _ = self.stop_tx.send(());
        Ok(())
    }
}
