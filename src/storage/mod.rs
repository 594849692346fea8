//! 持久化键值存储
//!
//! 会话数据保存在字符串键值存储中。`SessionStore` 是唯一允许读写会话键的组件，
//! 其它模块只通过它访问。

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::StorageConfig;
use crate::error::{ClientError, Result};
use std::sync::Arc;

/// 字符串键值存储
///
/// `write_batch` 必须在一次加锁内完成全部写入与删除，读取方不会观察到中间状态。
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn write_batch(&self, set: &[(&str, String)], remove: &[&str]) -> Result<()>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write_batch(&[(key, value.to_string())], &[])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.write_batch(&[], &[key])
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.write_batch(&[], keys)
    }
}

/// 根据配置创建存储后端
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "file" => Ok(Arc::new(FileStore::open(&config.path)?)),
        other => Err(ClientError::Config(format!("Unknown storage backend: {}", other))),
    }
}

pub(crate) fn poisoned() -> ClientError {
    ClientError::Storage("storage lock poisoned".to_string())
}
