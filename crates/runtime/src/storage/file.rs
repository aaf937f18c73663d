//! File-backed storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{ConfigStore, Result, StorageProvider, StoreError, StoreValue};

/// [`StorageProvider`] keeping each store as `<base_dir>/<name>.json`.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create the provider, creating `base_dir` if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn store_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{name}.json"))
    }
}

impl StorageProvider for FileStorage {
    fn open(&self, name: &str) -> Result<Box<dyn ConfigStore>> {
        Ok(Box::new(FileStore::open(self.store_path(name))?))
    }
}

/// One JSON document holding the whole property tree.
///
/// The file is read once on open. Every write rewrites the document through a
/// temp file and an atomic rename.
pub struct FileStore {
    path: PathBuf,
    tree: RwLock<BTreeMap<String, StoreValue>>,
}

impl FileStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tree = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let tree: BTreeMap<String, StoreValue> =
                serde_json::from_str(&json).map_err(|e| StoreError::Json(e.to_string()))?;
            tracing::debug!("Opened store {} with {} keys", path.display(), tree.len());
            tree
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            tree: RwLock::new(tree),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tree: &BTreeMap<String, StoreValue>) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");

        let json =
            serde_json::to_string_pretty(tree).map_err(|e| StoreError::Json(e.to_string()))?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!("Wrote store {}", self.path.display());
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoreValue) -> Result<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        tree.insert(key.to_string(), value);
        self.persist(&tree)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut tree = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        if tree.remove(key).is_some() {
            self.persist(&tree)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.keys().cloned().collect())
    }
}
