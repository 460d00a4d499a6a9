//! JSONファイルに永続化するストア
//!
//! 起動時に全体を読み込み、変更のたびにファイル全体を書き戻す。

use super::{change_channel, poisoned, KeyValueStore, StoreChange};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::sync::broadcast;

/// ストアファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    /// バージョン（互換性チェック用）
    version: u32,
    entries: BTreeMap<String, Value>,
}

impl StoreFile {
    const CURRENT_VERSION: u32 = 1;

    fn empty() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// 読めない・バージョン違いのファイルは空として扱う
    fn read(path: &Path) -> Self {
        if !path.exists() {
            return Self::empty();
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("ストアを開けません（空で開始）: {}: {}", path.display(), e);
                return Self::empty();
            }
        };

        match serde_json::from_reader::<_, StoreFile>(BufReader::new(file)) {
            Ok(store) if store.version == Self::CURRENT_VERSION => store,
            Ok(store) => {
                tracing::warn!(
                    "ストアのバージョン不一致 (v{})、空で開始します: {}",
                    store.version,
                    path.display()
                );
                Self::empty()
            }
            Err(e) => {
                tracing::warn!("ストアの解析に失敗（空で開始）: {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = StoreFile::read(&path);
        tracing::debug!("ストアを開きました: {} ({}キー)", path.display(), file.entries.len());

        Self {
            path,
            entries: RwLock::new(file.entries),
            changes: change_channel(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 書き込みに成功した場合だけ呼び出し側がメモリに反映する
    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = StoreFile {
            version: StoreFile::CURRENT_VERSION,
            entries: entries.clone(),
        };
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &file)?;
        writer.flush()?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        {
            let mut entries = self.entries.write().map_err(poisoned)?;
            let mut next = entries.clone();
            next.insert(key.to_string(), value.clone());
            self.persist(&next)?;
            *entries = next;
        }
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        {
            let mut entries = self.entries.write().map_err(poisoned)?;
            if !entries.contains_key(key) {
                return Ok(());
            }
            let mut next = entries.clone();
            next.remove(key);
            self.persist(&next)?;
            *entries = next;
        }
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            value: None,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"));
        assert!(store.get("users").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path);
        store.set("users", json!([{"id": "1"}])).unwrap();
        store.set("authToken", json!("abc")).unwrap();
        store.remove("authToken").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("users").unwrap(), Some(json!([{"id": "1"}])));
        assert!(reopened.get("authToken").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path);
        assert!(store.get("users").unwrap().is_none());
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path);
        store.set("users", json!(["alice"])).unwrap();
        let mut changes = store.subscribe();

        // 書き込み先をディレクトリにして失敗させる
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.set("users", json!(["bob"])).is_err());
        assert!(store.set("authToken", json!("abc")).is_err());
        assert!(store.remove("users").is_err());

        assert_eq!(store.get("users").unwrap(), Some(json!(["alice"])));
        assert!(store.get("authToken").unwrap().is_none());
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_version_mismatch_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"version": 99, "entries": {"users": []}}"#).unwrap();

        let store = FileStore::open(&path);
        assert!(store.get("users").unwrap().is_none());
    }
}
