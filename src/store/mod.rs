//! キーバリューストア
//!
//! 認証・履歴・係数テーブルはすべてこのトレイト越しに読み書きする。
//! 値はJSON。変更はsubscribeで購読できる。

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::{Result, WaterFootprintError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::PoisonError;
use tokio::sync::broadcast;

pub const USERS_KEY: &str = "users";
pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const EVENTS_KEY: &str = "estimationEvents";
pub const COEFFICIENTS_KEY: &str = "waterCoefficients";

/// 購読者に届く変更通知（削除時はvalueがNone）
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub value: Option<Value>,
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// 以後のset/removeを受け取るレシーバーを返す
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// 型付きの読み書き
pub trait KeyValueStoreExt: KeyValueStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        Ok(self.load(key)?.unwrap_or_default())
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

const CHANGE_CAPACITY: usize = 64;

fn change_channel() -> broadcast::Sender<StoreChange> {
    broadcast::channel(CHANGE_CAPACITY).0
}

fn poisoned<T>(_: PoisonError<T>) -> WaterFootprintError {
    WaterFootprintError::Store("ストアのロックが破損しています".into())
}
