pub mod store;
pub mod config;
pub mod logger;

// 重新导出常用类型，方便其他 crate 使用
pub use store::{ReactiveStore, StoreOptions, StoreError, StoreResult, KeyPath};
pub use config::Settings;
