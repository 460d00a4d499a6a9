use super::{change_channel, poisoned, KeyValueStore, StoreChange};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

/// プロセス内だけのストア（テスト・一時利用向け）
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            changes: change_channel(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.clone());
        // 購読者がいなければ送信エラーになるが問題ない
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = self.entries.write().map_err(poisoned)?.remove(key);
        if removed.is_some() {
            let _ = self.changes.send(StoreChange {
                key: key.to_string(),
                value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStoreExt;
    use serde_json::json;

    #[test]
    fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get("users").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("k", json!({"a": 1})).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_typed_load_and_save() {
        let store = MemoryStore::new();
        store.save("numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Vec<i32> = store.load_or_default("numbers").unwrap();
        assert_eq!(loaded, vec![1, 2, 3]);

        let missing: Vec<i32> = store.load_or_default("other").unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_null_loads_as_none() {
        let store = MemoryStore::new();
        store.set("authToken", Value::Null).unwrap();
        let token: Option<String> = store.load("authToken").unwrap();
        assert!(token.is_none());
    }

    #[test]
    fn test_subscribe_receives_changes() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store.set("k", json!(1)).unwrap();
        store.remove("k").unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.key, "k");
        assert_eq!(first.value, Some(json!(1)));

        let second = rx.try_recv().unwrap();
        assert_eq!(second.value, None);
    }

    #[test]
    fn test_remove_missing_key_is_silent() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        store.remove("nothing").unwrap();
        assert!(rx.try_recv().is_err());
    }
}
