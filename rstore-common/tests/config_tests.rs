use rstore_common::config::{Settings, DEFAULT_CONFIG};
use rstore_common::store::{MemoryBackend, ReactiveStore};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_config_defaults_creation() {
    let dir = tempdir().unwrap();
    let config_dir = dir.path().join("config");

    // 测试自动创建配置文件
    let settings = Settings::load_from(&config_dir).unwrap();
    assert!(config_dir.join("default.toml").exists());

    assert_eq!(settings.store.name, "reactiveStore");
    assert_eq!(settings.store.ttl_ms, 60000);
    assert_eq!(settings.backend.data_dir, "data/rstore");
    assert_eq!(settings.logging.log_file, "logs/rstore.log");
    assert_eq!(settings.logging.level, "info");

    let written = fs::read_to_string(config_dir.join("default.toml")).unwrap();
    assert_eq!(written, DEFAULT_CONFIG);
}

#[test]
fn test_config_existing_file_is_used() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("default.toml"),
        r#"[store]
name = "profile"
ttl_ms = -5

[backend]
data_dir = "/tmp/profile"

[logging]
log_file = "profile.log"
level = "debug"
"#,
    )
    .unwrap();

    let settings = Settings::load_from(dir.path()).unwrap();
    assert_eq!(settings.store.name, "profile");
    assert_eq!(settings.store.ttl_ms, -5);
    assert_eq!(settings.logging.level, "debug");

    let store = ReactiveStore::from_settings(&settings, Arc::new(MemoryBackend::new())).unwrap();
    assert_eq!(store.store_name(), "profile");
    assert_eq!(store.ttl(), -5);
}

#[test]
fn test_config_missing_section_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("default.toml"), "[store]\nname = \"x\"\nttl_ms = 1\n").unwrap();

    assert!(Settings::load_from(dir.path()).is_err());
}
