//! 配置管理器模块
//!
//! 对外暴露配置引擎的公共接口：加载、点查询、整体反序列化、
//! 变更观察和关闭。每个配置源对应一个独立的监听循环任务，
//! 负责在源变更后重跑合并与解析，并对已物化的单元格做差异通知

use crate::cell::Cell;
use crate::codec::CodecRegistry;
use crate::error::{ConfigError, Result};
use crate::source::{Source, Watcher};
use crate::store::Store;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 观察者回调，配置路径的解析值发生实际变更时触发
pub type Observer = Arc<dyn Fn(&str, &Cell) + Send + Sync>;

/// 监听循环失败后的固定重试间隔
const WATCH_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// 配置管理器
///
/// 持有配置存储、单元格缓存和观察者注册表；
/// 单元格读路径无锁，缓存未命中时的插入与存储查询共享互斥保护
pub struct ConfigManager {
    sources: Vec<Arc<dyn Source>>,
    store: Arc<Store>,
    cells: Arc<RwLock<HashMap<String, Arc<Cell>>>>,
    observers: Arc<RwLock<HashMap<String, Observer>>>,
    watchers: Mutex<Vec<Arc<dyn Watcher>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ConfigManager {
    /// 用默认编解码器注册表创建配置管理器
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self::with_registry(CodecRegistry::with_defaults(), sources)
    }

    /// 用自定义编解码器注册表创建配置管理器
    pub fn with_registry(registry: CodecRegistry, sources: Vec<Arc<dyn Source>>) -> Self {
        Self {
            sources,
            store: Arc::new(Store::new(registry)),
            cells: Arc::new(RwLock::new(HashMap::new())),
            observers: Arc::new(RwLock::new(HashMap::new())),
            watchers: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// 加载全部配置源并启动监听
    ///
    /// 按注册顺序逐源拉取并合并片段，为每个源启动监听循环，
    /// 最后统一解析占位符。启动阶段的合并/解析错误是致命的，
    /// 直接返回给调用方
    pub async fn load(&self) -> Result<()> {
        for source in &self.sources {
            let fragments = source.load().await?;
            for fragment in &fragments {
                debug!("配置片段已加载: {} format: {}", fragment.key, fragment.format);
            }
            self.store.merge(&fragments)?;

            let watcher = source.watch().await?;
            self.watchers.lock().push(watcher.clone());

            let handle = tokio::spawn(watch_loop(
                watcher,
                self.store.clone(),
                self.cells.clone(),
                self.observers.clone(),
            ));
            self.tasks.lock().push(handle);
        }
        self.store.resolve()?;
        info!("配置加载完成，共 {} 个配置源", self.sources.len());
        Ok(())
    }

    /// 查询点路径对应的单元格
    ///
    /// 首次命中时创建并缓存单元格，后续调用返回同一实例；
    /// 路径不存在返回 `Ok(None)`，关闭后返回 [`ConfigError::Closed`]
    pub fn value(&self, path: &str) -> Result<Option<Arc<Cell>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConfigError::Closed);
        }
        if let Some(cell) = self.cells.read().get(path) {
            return Ok(Some(cell.clone()));
        }
        let Some(value) = self.store.value(path)? else {
            return Ok(None);
        };
        let mut cells = self.cells.write();
        let cell = cells
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Cell::new(value)))
            .clone();
        Ok(Some(cell))
    }

    /// 把整棵配置树反序列化到调用方结构
    pub fn scan<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self.store.source()?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// 注册路径观察者
    ///
    /// 路径当前不存在时返回 [`ConfigError::NotFound`]；
    /// 同一路径重复注册时新观察者替换旧观察者
    pub fn watch<F>(&self, path: &str, observer: F) -> Result<()>
    where
        F: Fn(&str, &Cell) + Send + Sync + 'static,
    {
        if self.value(path)?.is_none() {
            return Err(ConfigError::NotFound {
                path: path.to_string(),
            });
        }
        self.observers
            .write()
            .insert(path.to_string(), Arc::new(observer));
        Ok(())
    }

    /// 关闭引擎，幂等
    ///
    /// 停止所有监听器、等待监听循环退出并关闭存储，
    /// 此后的任何操作返回 [`ConfigError::Closed`]
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let watchers: Vec<_> = self.watchers.lock().drain(..).collect();
        for watcher in watchers {
            watcher.stop().await?;
        }
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
        self.store.close();
        info!("配置引擎已关闭");
        Ok(())
    }
}

/// 单个配置源的监听循环
///
/// 源变更后重跑合并与解析；合并/解析失败只记录日志并退避重试，
/// 监听循环不因瞬时失败而终止。成功后遍历所有已物化的单元格，
/// 新值与旧值类型一致且不相等时替换槽位并触发观察者；
/// 类型变化视为无变更，不触发通知
async fn watch_loop(
    watcher: Arc<dyn Watcher>,
    store: Arc<Store>,
    cells: Arc<RwLock<HashMap<String, Arc<Cell>>>>,
    observers: Arc<RwLock<HashMap<String, Observer>>>,
) {
    loop {
        let fragments = match watcher.next().await {
            Ok(fragments) => fragments,
            Err(ConfigError::Canceled) => {
                info!("配置监听已取消，监听循环退出");
                return;
            }
            Err(e) => {
                error!("获取配置变更失败: {}", e);
                tokio::time::sleep(WATCH_RETRY_BACKOFF).await;
                continue;
            }
        };

        if let Err(e) = store.merge(&fragments) {
            error!("合并配置变更失败: {}", e);
            tokio::time::sleep(WATCH_RETRY_BACKOFF).await;
            continue;
        }
        if let Err(e) = store.resolve() {
            error!("解析配置变更失败: {}", e);
            tokio::time::sleep(WATCH_RETRY_BACKOFF).await;
            continue;
        }

        let materialized: Vec<(String, Arc<Cell>)> = cells
            .read()
            .iter()
            .map(|(path, cell)| (path.clone(), cell.clone()))
            .collect();
        for (path, cell) in materialized {
            let new_value = match store.value(&path) {
                Ok(Some(value)) => value,
                _ => continue,
            };
            let current = cell.get();
            if new_value.same_type(&current) && new_value != *current {
                cell.store(new_value);
                debug!("配置路径已更新: {}", path);
                let observer = observers.read().get(&path).cloned();
                if let Some(observer) = observer {
                    observer(&path, &cell);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Fragment, MemorySource};
    use crate::value::Value;
    use serde::Deserialize;
    use std::sync::atomic::AtomicUsize;

    fn json_fragment(content: &str) -> Fragment {
        Fragment::new("app.json", content.as_bytes().to_vec(), "json")
    }

    /// 等待条件成立，超时则失败
    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("等待条件超时");
    }

    #[tokio::test]
    async fn test_load_and_value() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(
            r#"{"service":{"name":{"alias":"x"}}}"#,
        )]));
        let manager = ConfigManager::new(vec![source]);
        manager.load().await.unwrap();

        let cell = manager.value("service.name.alias").unwrap().unwrap();
        assert_eq!(*cell.get(), Value::Text("x".to_string()));
        assert!(manager.value("service.missing").unwrap().is_none());

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_scan_into_struct() {
        #[derive(Deserialize)]
        struct App {
            server: Server,
        }
        #[derive(Deserialize)]
        struct Server {
            port: i64,
        }

        let source = Arc::new(MemorySource::new(vec![json_fragment(
            r#"{"server":{"port":8080}}"#,
        )]));
        let manager = ConfigManager::new(vec![source]);
        manager.load().await.unwrap();

        let app: App = manager.scan().unwrap();
        assert_eq!(app.server.port, 8080);

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_load_resolves_placeholders() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(
            r#"{"PORT":"8080","addr":"0.0.0.0:${PORT:9090}"}"#,
        )]));
        let manager = ConfigManager::new(vec![source]);
        manager.load().await.unwrap();

        let cell = manager.value("addr").unwrap().unwrap();
        assert_eq!(cell.repr(), "0.0.0.0:8080");

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_observer_fires_once_on_real_change() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(r#"{"a":{"b":1}}"#)]));
        let manager = ConfigManager::new(vec![source.clone()]);
        manager.load().await.unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let fired = fired.clone();
            let seen = seen.clone();
            manager
                .watch("a.b", move |_path, cell| {
                    fired.fetch_add(1, Ordering::SeqCst);
                    seen.lock().push(cell.as_int());
                })
                .unwrap();
        }

        // 同类型不同值，观察者恰好触发一次
        source.push(vec![json_fragment(r#"{"a":{"b":2}}"#)]);
        wait_until(|| fired.load(Ordering::SeqCst) == 1).await;
        assert_eq!(seen.lock().as_slice(), &[2]);

        // 相同值不触发
        source.push(vec![json_fragment(r#"{"a":{"b":2}}"#)]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let cell = manager.value("a.b").unwrap().unwrap();
        assert_eq!(cell.as_int(), 2);

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_type_change_treated_as_no_change() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(r#"{"a":{"b":"x"}}"#)]));
        let manager = ConfigManager::new(vec![source.clone()]);
        manager.load().await.unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        {
            let fired = fired.clone();
            manager
                .watch("a.b", move |_, _| {
                    fired.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        // 字符串变整数，类型门禁拦下更新
        source.push(vec![json_fragment(r#"{"a":{"b":1}}"#)]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let cell = manager.value("a.b").unwrap().unwrap();
        assert_eq!(*cell.get(), Value::Text("x".to_string()));

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_missing_path_not_found() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(r#"{"a":1}"#)]));
        let manager = ConfigManager::new(vec![source]);
        manager.load().await.unwrap();

        let result = manager.watch("missing", |_, _| {});
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(r#"{"a":1}"#)]));
        let manager = ConfigManager::new(vec![source]);
        manager.load().await.unwrap();

        manager.close().await.unwrap();
        manager.close().await.unwrap();

        assert!(matches!(manager.value("a"), Err(ConfigError::Closed)));
        assert!(matches!(
            manager.scan::<serde_json::Value>(),
            Err(ConfigError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_value_rejects_cached_cell_after_close() {
        let source = Arc::new(MemorySource::new(vec![json_fragment(r#"{"a":1}"#)]));
        let manager = ConfigManager::new(vec![source]);
        manager.load().await.unwrap();

        // 先物化单元格，关闭后缓存命中同样要报已关闭
        let cell = manager.value("a").unwrap().unwrap();
        assert_eq!(cell.as_int(), 1);

        manager.close().await.unwrap();
        assert!(matches!(manager.value("a"), Err(ConfigError::Closed)));
        assert!(matches!(
            manager.watch("a", |_, _| {}),
            Err(ConfigError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_multi_source_precedence() {
        // 后注册的源覆盖先注册的源
        let base = Arc::new(MemorySource::new(vec![json_fragment(
            r#"{"p":1,"only_base":true}"#,
        )]));
        let overlay = Arc::new(MemorySource::new(vec![json_fragment(r#"{"p":2}"#)]));
        let manager = ConfigManager::new(vec![base, overlay]);
        manager.load().await.unwrap();

        let cell = manager.value("p").unwrap().unwrap();
        assert_eq!(cell.as_int(), 2);
        let cell = manager.value("only_base").unwrap().unwrap();
        assert!(cell.as_bool());

        manager.close().await.unwrap();
    }
}
