//! 文件配置源
//!
//! 支持单个文件或目录，格式标签取自文件扩展名；
//! 通过文件系统事件实现变更监听

use crate::error::{ConfigError, Result};
use crate::source::{Fragment, Source, Watcher};
use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};

/// 文件配置源
///
/// 路径指向文件时加载单个片段；指向目录时加载目录下所有
/// 非隐藏的普通文件，每个文件一个片段
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// 创建文件配置源
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Source for FileSource {
    async fn load(&self) -> Result<Vec<Fragment>> {
        let meta = tokio::fs::metadata(&self.path).await?;
        if meta.is_dir() {
            load_dir(&self.path).await
        } else {
            Ok(vec![load_file(&self.path).await?])
        }
    }

    async fn watch(&self) -> Result<Arc<dyn Watcher>> {
        let watcher = FileWatcher::new(self.path.clone())?;
        Ok(Arc::new(watcher))
    }
}

/// 加载目录下所有非隐藏普通文件
async fn load_dir(path: &Path) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::new();
    let mut entries = tokio::fs::read_dir(path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || entry.file_type().await?.is_dir() {
            continue;
        }
        fragments.push(load_file(&entry.path()).await?);
    }
    Ok(fragments)
}

/// 加载单个文件为配置片段，键为文件名，格式为扩展名
async fn load_file(path: &Path) -> Result<Fragment> {
    let data = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    log::debug!("加载配置文件: {} format: {}", name, format);
    Ok(Fragment::new(name, data, format))
}

/// 文件变更监听器
///
/// 监控目标文件所在目录（或目录本身），在修改/创建事件后
/// 重新加载变更的文件
pub struct FileWatcher {
    path: PathBuf,
    canonical: PathBuf,
    is_dir: bool,
    events: Mutex<mpsc::UnboundedReceiver<notify::Result<Event>>>,
    stop_rx: Mutex<broadcast::Receiver<()>>,
    stop_tx: broadcast::Sender<()>,
    stopped: AtomicBool,
    fs_watcher: parking_lot::Mutex<Option<RecommendedWatcher>>,
}

impl FileWatcher {
    fn new(path: PathBuf) -> Result<Self> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        let is_dir = canonical.is_dir();

        let (tx, rx) = mpsc::unbounded_channel();
        let mut fs_watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .map_err(|e| ConfigError::Watch(e.to_string()))?;

        // 文件被编辑器原子替换时 inode 会变化，监控所在目录而非文件本身
        let watch_target = if is_dir {
            canonical.clone()
        } else {
            canonical
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| canonical.clone())
        };
        fs_watcher
            .watch(&watch_target, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Watch(e.to_string()))?;

        let (stop_tx, stop_rx) = broadcast::channel(1);
        log::info!("启动配置文件监控: {}", path.display());

        Ok(Self {
            path,
            canonical,
            is_dir,
            events: Mutex::new(rx),
            stop_rx: Mutex::new(stop_rx),
            stop_tx,
            stopped: AtomicBool::new(false),
            fs_watcher: parking_lot::Mutex::new(Some(fs_watcher)),
        })
    }

    /// 判断事件是否针对目标文件
    fn is_relevant(&self, event: &Event) -> bool {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return false;
        }
        if self.is_dir {
            // 目录模式下忽略隐藏文件
            event.paths.iter().any(|p| {
                p.file_name()
                    .map(|n| !n.to_string_lossy().starts_with('.'))
                    .unwrap_or(false)
            })
        } else {
            event.paths.iter().any(|p| p == &self.canonical)
        }
    }

    /// 变更事件对应的重新加载路径
    fn reload_path(&self, event: &Event) -> PathBuf {
        if self.is_dir {
            if let Some(name) = event.paths.first().and_then(|p| p.file_name()) {
                return self.path.join(name);
            }
        }
        self.path.clone()
    }
}

#[async_trait]
impl Watcher for FileWatcher {
    async fn next(&self) -> Result<Vec<Fragment>> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ConfigError::Canceled);
        }
        let mut stop_rx = self.stop_rx.lock().await;
        let mut events = self.events.lock().await;
        loop {
            tokio::select! {
                _ = stop_rx.recv() => return Err(ConfigError::Canceled),
                maybe = events.recv() => match maybe {
                    // 事件通道关闭等价于监控结束
                    None => return Err(ConfigError::Canceled),
                    Some(Err(e)) => return Err(ConfigError::Watch(e.to_string())),
                    Some(Ok(event)) => {
                        if !self.is_relevant(&event) {
                            continue;
                        }
                        log::debug!("检测到配置文件变更事件: {:?}", event.kind);
                        let fragment = load_file(&self.reload_path(&event)).await?;
                        return Ok(vec![fragment]);
                    }
                },
            }
        }
    }

    async fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let _ = self.stop_tx.send(());
        // 丢弃文件系统监控器以停止事件产生
        self.fs_watcher.lock().take();
        log::info!("配置文件监控已停止: {}", self.path.display());
        Ok(())
    }
}
