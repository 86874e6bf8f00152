use std::fmt;

/// 存储操作错误类型
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// 路径为空或无法解析出任何段
    InvalidPath(String),
    /// 路径途经的节点不是对象或数组
    TypeMismatch { path: String, segment: String, found: String },
    /// 序列化错误
    SerializationError(String),
    /// 反序列化错误（持久化的 JSON 已损坏）
    DeserializationError(String),
    /// 文件IO错误
    IoError(String),
    /// 配置错误
    ConfigError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidPath(path) => write!(f, "无效路径: '{}'", path),
            StoreError::TypeMismatch { path, segment, found } => {
                write!(
                    f,
                    "路径 '{}' 在段 '{}' 处无法继续: 遇到 {}",
                    path, segment, found
                )
            }
            StoreError::SerializationError(msg) => write!(f, "序列化错误: {}", msg),
            StoreError::DeserializationError(msg) => write!(f, "反序列化错误: {}", msg),
            StoreError::IoError(msg) => write!(f, "IO错误: {}", msg),
            StoreError::ConfigError(msg) => write!(f, "配置错误: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// 存储操作结果类型
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::SerializationError(error.to_string())
    }
}
