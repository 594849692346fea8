use super::{poisoned, KeyValueStore};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::RwLock;

/// 内存存储
///
/// 进程退出即丢失，适用于测试和一次性脚本。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn write_batch(&self, set: &[(&str, String)], remove: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        for key in remove {
            entries.remove(*key);
        }
        for (key, value) in set {
            entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
