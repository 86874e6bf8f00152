mod error;
mod path;
mod backend;
mod events;
mod expiry;
mod metadata;
mod store_core;

pub use error::{StoreError, StoreResult};
pub use path::KeyPath;
pub use backend::{StorageBackend, MemoryBackend, FileBackend};
pub use events::{EventHost, EventTarget, LogEventHost, StoreEvent, UPDATED_TOKEN};
pub use expiry::{Clock, SystemClock, ManualClock, TIMESTAMPS_STORE};
pub use metadata::StoreMetadata;
pub use store_core::{ReactiveStore, StoreOptions, DEFAULT_STORE_NAME, DEFAULT_TTL_MS};
