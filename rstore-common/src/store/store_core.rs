use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Settings;
use super::backend::StorageBackend;
use super::error::{StoreError, StoreResult};
use super::events::{EventHost, StoreEvent};
use super::expiry::{self, Clock, SystemClock, TIMESTAMPS_STORE};
use super::metadata::StoreMetadata;
use super::path::{self, KeyPath};

/// 默认存储名称
pub const DEFAULT_STORE_NAME: &str = "reactiveStore";
/// 默认生存时间（毫秒）
pub const DEFAULT_TTL_MS: i64 = 60_000;

/// 构造 `ReactiveStore` 的选项
#[derive(Clone, Default)]
pub struct StoreOptions {
    store_name: Option<String>,
    ttl: Option<i64>,
    backend: Option<Arc<dyn StorageBackend>>,
    event_host: Option<Arc<dyn EventHost>>,
    clock: Option<Arc<dyn Clock>>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 存储名称，空字符串等同于未设置
    pub fn with_store_name(mut self, store_name: impl Into<String>) -> Self {
        self.store_name = Some(store_name.into());
        self
    }

    /// 生存时间（毫秒），允许为负数；0 等同于未设置
    pub fn with_ttl(mut self, ttl_ms: i64) -> Self {
        self.ttl = Some(ttl_ms);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_event_host(mut self, event_host: Arc<dyn EventHost>) -> Self {
        self.event_host = Some(event_host);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

/// 带路径访问、TTL 和变更通知的键值存储
///
/// 后端中维护两份 JSON 文档：以存储名称命名的主文档，以及 `_timestamps` 时间戳文档。
/// 每次操作都是对整份文档的读-改-写，两份文档之间不保证原子性；
/// 多个调用方共享同一后端时，后写入者覆盖先写入者。
///
/// 过期只在读取时检查（惰性过期），没有后台清理。
pub struct ReactiveStore {
    store_name: String,
    ttl: i64,
    backend: Arc<dyn StorageBackend>,
    event_host: Option<Arc<dyn EventHost>>,
    clock: Arc<dyn Clock>,
}

impl ReactiveStore {
    /// 创建存储，必须提供后端
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        let backend = options
            .backend
            .ok_or_else(|| StoreError::ConfigError("未配置存储后端".to_string()))?;

        let store_name = options
            .store_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string());

        let store = Self {
            store_name,
            ttl: options.ttl.filter(|&ttl| ttl != 0).unwrap_or(DEFAULT_TTL_MS),
            backend,
            event_host: options.event_host,
            clock: options.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        debug!(
            "创建存储 '{}': ttl={}ms, 事件宿主={}",
            store.store_name,
            store.ttl,
            store.event_host.is_some()
        );
        Ok(store)
    }

    /// 使用配置文件中的 `[store]` 段构建
    pub fn from_settings(
        settings: &Settings,
        backend: Arc<dyn StorageBackend>,
    ) -> StoreResult<Self> {
        Self::new(
            StoreOptions::new()
                .with_store_name(settings.store.name.clone())
                .with_ttl(settings.store.ttl_ms)
                .with_backend(backend),
        )
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// 在配置的存储中写入值
    pub fn set_item<K, T>(&self, key: K, data: T) -> StoreResult<()>
    where
        K: Into<KeyPath>,
        T: Serialize,
    {
        self.set_item_in(key, data, &self.store_name)
    }

    /// 以 `store_name` 指定的文档为基础写入值
    ///
    /// 注意：修改后的文档总是写回实例配置的存储名称，`store_name` 只决定读取哪份文档。
    pub fn set_item_in<K, T>(&self, key: K, data: T, store_name: &str) -> StoreResult<()>
    where
        K: Into<KeyPath>,
        T: Serialize,
    {
        let path = key.into();
        // 序列化失败时不会发生任何写入
        let value = serde_json::to_value(data)?;

        let mut document = self.fetch_store(store_name)?;
        path::set_value(&mut document, &path, value)?;
        self.persist_store(&document)?;

        self.set_timestamp(path.raw())?;
        self.emit(path.raw());

        debug!("写入键 '{}' (基于文档 '{}')", path, store_name);
        Ok(())
    }

    /// 从配置的存储中读取值
    pub fn get_item<K: Into<KeyPath>>(&self, key: K) -> StoreResult<Option<Value>> {
        self.get_item_in(key, &self.store_name)
    }

    /// 从 `store_name` 指定的文档中读取值
    ///
    /// 没有时间戳的键视为未写入；已过期的键会从配置的存储中移除，且不发出事件。
    pub fn get_item_in<K: Into<KeyPath>>(
        &self,
        key: K,
        store_name: &str,
    ) -> StoreResult<Option<Value>> {
        let path = key.into();
        if path.is_empty() {
            return Ok(None);
        }

        let timestamps = self.fetch_timestamps()?;
        let Some(written_at) = expiry::timestamp_of(&timestamps, path.raw()) else {
            return Ok(None);
        };

        if expiry::is_expired(self.clock.now_millis(), written_at, self.ttl) {
            info!("键 '{}' 已过期，执行惰性清理", path);
            self.remove_value(&path, &self.store_name)?;
            self.delete_timestamp(path.raw())?;
            return Ok(None);
        }

        let document = self.fetch_store(store_name)?;
        Ok(path::get_value(&document, &path).cloned())
    }

    /// 读取值并反序列化为指定类型
    pub fn get_item_as<K, T>(&self, key: K) -> StoreResult<Option<T>>
    where
        K: Into<KeyPath>,
        T: DeserializeOwned,
    {
        self.get_item(key)?
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| StoreError::DeserializationError(e.to_string()))
            })
            .transpose()
    }

    /// 从配置的存储中删除值
    pub fn delete_item<K: Into<KeyPath>>(&self, key: K) -> StoreResult<()> {
        self.delete_item_in(key, &self.store_name)
    }

    /// 以 `store_name` 指定的文档为基础删除值，结果写回配置的存储
    ///
    /// 删除会清除整份文档中所有值为 null 的字段，而不只是目标键。
    pub fn delete_item_in<K: Into<KeyPath>>(&self, key: K, store_name: &str) -> StoreResult<()> {
        let path = key.into();

        self.remove_value(&path, store_name)?;
        self.delete_timestamp(path.raw())?;
        self.emit(path.raw());

        debug!("删除键 '{}' (基于文档 '{}')", path, store_name);
        Ok(())
    }

    /// 配置与时间戳的只读快照
    pub fn metadata(&self) -> StoreResult<StoreMetadata> {
        Ok(StoreMetadata {
            store_name: self.store_name.clone(),
            ttl: self.ttl,
            backend: Arc::clone(&self.backend),
            event_host: self.event_host.clone(),
            timestamps: expiry::export_timestamps(&self.fetch_timestamps()?),
        })
    }

    /// 置 null 后清除全部 null 字段，写回配置的存储
    fn remove_value(&self, path: &KeyPath, store_name: &str) -> StoreResult<()> {
        let mut document = self.fetch_store(store_name)?;
        path::set_value(&mut document, path, Value::Null)?;
        self.persist_store(&path::strip_nulls(document))
    }

    /// 读取命名文档；不存在、为空或解析为 null 类值时返回空对象
    fn fetch_store(&self, name: &str) -> StoreResult<Value> {
        let raw = match self.backend.get_item(name)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Value::Object(Map::new())),
        };

        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            let message = format!("文档 '{}' 不是合法的 JSON: {}", name, e);
            StoreError::DeserializationError(message)
        })?;

        if is_nullish(&value) {
            Ok(Value::Object(Map::new()))
        } else {
            Ok(value)
        }
    }

    fn persist_store(&self, document: &Value) -> StoreResult<()> {
        let encoded = serde_json::to_string(document)?;
        self.backend.set_item(&self.store_name, &encoded)
    }

    fn fetch_timestamps(&self) -> StoreResult<Map<String, Value>> {
        match self.fetch_store(TIMESTAMPS_STORE)? {
            Value::Object(timestamps) => Ok(timestamps),
            _ => Ok(Map::new()),
        }
    }

    fn set_timestamp(&self, key: &str) -> StoreResult<()> {
        let mut timestamps = self.fetch_timestamps()?;
        timestamps.insert(key.to_string(), Value::from(self.clock.now_millis()));

        let encoded = serde_json::to_string(&timestamps)?;
        self.backend.set_item(TIMESTAMPS_STORE, &encoded)
    }

    fn delete_timestamp(&self, key: &str) -> StoreResult<()> {
        let mut timestamps = self.fetch_timestamps()?;
        if timestamps.remove(key).is_none() {
            return Ok(());
        }

        if timestamps.is_empty() {
            self.backend.remove_item(TIMESTAMPS_STORE)
        } else {
            let encoded = serde_json::to_string(&timestamps)?;
            self.backend.set_item(TIMESTAMPS_STORE, &encoded)
        }
    }

    fn emit(&self, key: &str) {
        if let Some(event_host) = &self.event_host {
            event_host.dispatch_event(&StoreEvent::updated(&self.store_name, key));
        }
    }
}

impl fmt::Debug for ReactiveStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveStore")
            .field("store_name", &self.store_name)
            .field("ttl", &self.ttl)
            .field("has_event_host", &self.event_host.is_some())
            .finish()
    }
}

/// null、false、0 和空字符串都按空文档处理
fn is_nullish(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
