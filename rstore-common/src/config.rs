use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    pub ttl_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_file: String,
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub store: StoreConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

pub const DEFAULT_CONFIG: &str = r#"[store]
# 主文档在后端中的名称
name = "reactiveStore"
# 键的生存时间(毫秒)，可以为负数
ttl_ms = 60000

[backend]
# 文件后端的数据目录
data_dir = "data/rstore"

[logging]
# 日志文件路径
log_file = "logs/rstore.log"
# 日志级别: "error", "warn", "info", "debug", "trace"
level = "info"
"#;

impl Settings {
    /// 从 `config/default.toml` 加载，文件不存在时写入默认配置
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// 从指定目录下的 `default.toml` 加载，文件不存在时写入默认配置
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_config_path = config_dir.join("default.toml");

        // 确保配置目录存在
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(|e| {
                ConfigError::Message(format!("无法创建配置目录: {}", e))
            })?;
        }

        if !default_config_path.exists() {
            let mut file = fs::File::create(&default_config_path).map_err(|e| {
                ConfigError::Message(format!("无法创建配置文件: {}", e))
            })?;

            file.write_all(DEFAULT_CONFIG.as_bytes()).map_err(|e| {
                ConfigError::Message(format!("无法写入配置文件: {}", e))
            })?;
        }

        let settings = Config::builder()
            .add_source(File::from(default_config_path))
            .build()?;

        settings.try_deserialize()
    }
}
