use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::backend::StorageBackend;
use super::events::EventHost;

/// 存储实例的只读快照，用于诊断和测试
#[derive(Clone)]
pub struct StoreMetadata {
    /// 配置的存储名称
    pub store_name: String,
    /// 生存时间（毫秒）
    pub ttl: i64,
    /// 后端引用
    pub backend: Arc<dyn StorageBackend>,
    /// 事件宿主引用
    pub event_host: Option<Arc<dyn EventHost>>,
    /// 当前时间戳映射（键 -> 写入时间毫秒）
    ///
    /// 非数字或为 0 的条目按“从未写入”处理，不出现在这里。
    pub timestamps: BTreeMap<String, i64>,
}

impl fmt::Debug for StoreMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreMetadata")
            .field("store_name", &self.store_name)
            .field("ttl", &self.ttl)
            .field("has_event_host", &self.event_host.is_some())
            .field("timestamps", &self.timestamps)
            .finish()
    }
}

impl fmt::Display for StoreMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "存储信息:")?;
        writeln!(f, "  名称: {}", self.store_name)?;
        writeln!(f, "  TTL: {}ms", self.ttl)?;
        let event_host = if self.event_host.is_some() { "已配置" } else { "未配置" };
        writeln!(f, "  事件宿主: {}", event_host)?;
        writeln!(f, "  时间戳条目: {}", self.timestamps.len())?;
        for (key, written_at) in &self.timestamps {
            writeln!(f, "    {} = {}", key, written_at)?;
        }
        Ok(())
    }
}
