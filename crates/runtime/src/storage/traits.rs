//! Storage contracts shared by every backend.

use serde::{Deserialize, Serialize};

use super::{Result, StoreError};

/// A value in the property tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(untagged)]
#[strum(serialize_all = "snake_case")]
pub enum StoreValue {
    Text(String),
    List(Vec<String>),
}

impl StoreValue {
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for StoreValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Flat, string-keyed configuration store.
///
/// Keys are opaque dotted paths; the registry decides the layout (see
/// [`keys`](super::keys)). Implementations persist on every write; there is
/// no explicit flush.
pub trait ConfigStore: Send + Sync {
    /// Read a value; `None` if the key was never set or was deleted.
    fn get(&self, key: &str) -> Result<Option<StoreValue>>;

    /// Write a value, replacing whatever the key held.
    fn set(&self, key: &str, value: StoreValue) -> Result<()>;

    /// Remove a key. Missing keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Every key currently present, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Read a text value, failing if the key holds a list.
    fn get_text(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoreValue::Text(text)) => Ok(Some(text)),
            Some(other) => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Read a list value, failing if the key holds text.
    fn get_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoreValue::List(list)) => Ok(Some(list)),
            Some(other) => Err(StoreError::TypeMismatch {
                key: key.to_string(),
                expected: "list",
                found: other.kind(),
            }),
        }
    }
}

/// Opens named stores.
///
/// Opening the same name twice must observe the same persisted data; this is
/// how the registry re-reads its configuration on reload.
pub trait StorageProvider: Send + Sync {
    fn open(&self, name: &str) -> Result<Box<dyn ConfigStore>>;
}
