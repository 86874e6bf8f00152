use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Map, Value};

/// 时间戳文档在后端中的固定名称
pub const TIMESTAMPS_STORE: &str = "_timestamps";

/// 毫秒级时钟
pub trait Clock: Send + Sync {
    /// 当前 Unix 时间戳（毫秒）
    fn now_millis(&self) -> i64;
}

/// 系统墙上时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// 手动推进的时钟，用于测试和模拟
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    /// 向前推进指定毫秒数
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// 当前时间严格大于 写入时间 + ttl 时视为过期
pub(crate) fn is_expired(now: i64, written_at: i64, ttl: i64) -> bool {
    now > written_at.saturating_add(ttl)
}

/// 读取时间戳条目，缺失、非数字或为 0 都视为从未写入
pub(crate) fn timestamp_of(timestamps: &Map<String, Value>, key: &str) -> Option<i64> {
    timestamps
        .get(key)
        .and_then(|value| value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)))
        .filter(|&written_at| written_at != 0)
}

/// 导出所有数字型时间戳
pub(crate) fn export_timestamps(timestamps: &Map<String, Value>) -> BTreeMap<String, i64> {
    timestamps
        .keys()
        .filter_map(|key| timestamp_of(timestamps, key).map(|written_at| (key.clone(), written_at)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_boundary_is_strict() {
        assert!(!is_expired(1_000, 1_000, 0));
        assert!(is_expired(1_001, 1_000, 0));
        assert!(!is_expired(61_000, 1_000, 60_000));
        assert!(is_expired(1_000, 1_000, -1_000));
        assert!(!is_expired(i64::MAX, 1, i64::MAX));
    }

    #[test]
    fn test_timestamp_of_ignores_non_numbers() {
        let Value::Object(timestamps) = json!({"a": 5, "b": "x", "c": 0, "d": 7.9}) else {
            unreachable!()
        };
        assert_eq!(timestamp_of(&timestamps, "a"), Some(5));
        assert_eq!(timestamp_of(&timestamps, "b"), None);
        assert_eq!(timestamp_of(&timestamps, "c"), None);
        assert_eq!(timestamp_of(&timestamps, "d"), Some(7));
        assert_eq!(timestamp_of(&timestamps, "missing"), None);
        assert_eq!(export_timestamps(&timestamps).len(), 2);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now_millis(), 150);
        clock.set(7);
        assert_eq!(clock.now_millis(), 7);
    }
}
