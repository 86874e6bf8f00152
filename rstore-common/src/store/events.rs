use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 变更事件名中的固定分隔符
pub const UPDATED_TOKEN: &str = ":updated:";

/// 存储变更事件，只携带事件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    name: String,
}

impl StoreEvent {
    /// 构造 `<store_name>:updated:<key>` 事件
    pub fn updated(store_name: &str, key: &str) -> Self {
        Self {
            name: format!("{}{}{}", store_name, UPDATED_TOKEN, key),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 事件宿主：负责分发具名事件
pub trait EventHost: Send + Sync {
    fn dispatch_event(&self, event: &StoreEvent);
}

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// 按事件名注册监听器的事件宿主
#[derive(Default)]
pub struct EventTarget {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    dispatched: AtomicUsize,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册监听器，同名监听器按注册顺序调用
    pub fn add_event_listener<F>(&self, name: &str, listener: F)
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(listener));
    }

    /// 已分发的事件总数（包括没有监听器的事件）
    pub fn dispatched_count(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }
}

impl EventHost for EventTarget {
    fn dispatch_event(&self, event: &StoreEvent) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);

        // 先复制监听器列表再调用，监听器内部可以继续注册
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(event.name())
            .cloned()
            .unwrap_or_default();

        for listener in listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("EventTarget")
            .field("event_names", &listeners.keys().collect::<Vec<_>>())
            .field("dispatched", &self.dispatched_count())
            .finish()
    }
}

/// 把事件写入日志的宿主
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventHost;

impl EventHost for LogEventHost {
    fn dispatch_event(&self, event: &StoreEvent) {
        log::info!("事件: {}", event.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listeners_receive_matching_events() {
        let target = EventTarget::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        target.add_event_listener("s:updated:a", move |event| {
            assert_eq!(event.name(), "s:updated:a");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        target.dispatch_event(&StoreEvent::updated("s", "a"));
        target.dispatch_event(&StoreEvent::updated("s", "b"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(target.dispatched_count(), 2);
    }
}
