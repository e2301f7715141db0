//! Local backup storage
//!
//! A `localStorage`-style string key/value store.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::Result;

pub trait LocalStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

pub struct MemoryLocalStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_local_store() {
        let store = MemoryLocalStore::new();
        assert_eq!(store.get_item("k").unwrap(), None);

        store.set_item("k", "v").unwrap();
        assert_eq!(store.get_item("k").unwrap(), Some("v".to_string()));

        store.remove_item("k").unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
    }
}
