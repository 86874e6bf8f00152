use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use base64::prelude::*;

use super::error::{StoreError, StoreResult};

/// 同步、仅支持字符串的持久化键值后端
///
/// 每次 `set_item` 都是整份文档替换，不做合并。
pub trait StorageBackend: Send + Sync {
    /// 读取命名文档，不存在时返回 None
    fn get_item(&self, name: &str) -> StoreResult<Option<String>>;

    /// 写入命名文档
    fn set_item(&self, name: &str, value: &str) -> StoreResult<()>;

    /// 删除命名文档
    fn remove_item(&self, name: &str) -> StoreResult<()>;
}

/// 进程内内存后端
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // 锁中毒时数据仍然完整，直接取回
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 所有文档的快照
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.items().clone()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn clear(&self) {
        self.items().clear();
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, name: &str) -> StoreResult<Option<String>> {
        Ok(self.items().get(name).cloned())
    }

    fn set_item(&self, name: &str, value: &str) -> StoreResult<()> {
        self.items().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, name: &str) -> StoreResult<()> {
        self.items().remove(name);
        Ok(())
    }
}

/// 文件后端：每个命名文档对应目录下的一个文件
#[derive(Debug, Clone)]
pub struct FileBackend {
    base_path: PathBuf,
}

impl FileBackend {
    /// 打开（必要时创建）数据目录
    pub fn new<P: AsRef<Path>>(base_path: P) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            StoreError::IoError(format!("无法创建数据目录 {}: {}", base_path.display(), e))
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 获取文档的磁盘文件路径
    fn get_item_file_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.json", BASE64_URL_SAFE_NO_PAD.encode(name)))
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, name: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.get_item_file_path(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, name: &str, value: &str) -> StoreResult<()> {
        let path = self.get_item_file_path(name);
        // 先写临时文件再改名
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        log::trace!("写入文档 '{}' -> {}", name, path.display());
        Ok(())
    }

    fn remove_item(&self, name: &str) -> StoreResult<()> {
        match fs::remove_file(self.get_item_file_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();

        // 目标位置是非空目录，改名必然失败
        let target = backend.get_item_file_path("blocked");
        fs::create_dir_all(target.join("occupied")).unwrap();

        let err = backend.set_item("blocked", "{}").unwrap_err();
        assert!(matches!(err, StoreError::IoError(_)));
        assert!(!target.with_extension("json.tmp").exists());

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
