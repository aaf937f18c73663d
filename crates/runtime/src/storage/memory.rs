//! In-memory storage for tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use super::{ConfigStore, Result, StorageProvider, StoreError, StoreValue};

type Tree = Arc<RwLock<BTreeMap<String, StoreValue>>>;

/// In-memory [`StorageProvider`].
///
/// Every store name maps to one shared tree, so re-opening a store sees what
/// previous handles wrote. Nothing survives the process.
#[derive(Default)]
pub struct InMemoryStorage {
    stores: RwLock<HashMap<String, Tree>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageProvider for InMemoryStorage {
    fn open(&self, name: &str) -> Result<Box<dyn ConfigStore>> {
        let mut stores = self
            .stores
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let tree = stores.entry(name.to_string()).or_default().clone();
        Ok(Box::new(InMemoryStore { tree }))
    }
}

/// Handle to one in-memory tree.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tree: Tree,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoreValue) -> Result<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        tree.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        tree.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.keys().cloned().collect())
    }
}
