//! Key-value storage for feedback and version records.
//!
//! Keys are flat strings (`LIKE_{agent}_{id}`, `VERSION_{agent}`, ...);
//! values are JSON. [`JsonFileStore`] keeps the whole map in memory and
//! rewrites the file atomically after every mutation; the in-memory map only
//! changes once the write succeeded.

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::RwLock,
};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError
{
    #[error("store I/O failed for {path}: {source}")]
    Io
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is not valid JSON: {source}")]
    Corrupt
    {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

pub trait ProfileStore: Send + Sync
{
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<Value>, StoreError>;

    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Returns whether the key was present
    fn remove(
        &self,
        key: &str,
    ) -> Result<bool, StoreError>;

    fn exists(
        &self,
        key: &str,
    ) -> Result<bool, StoreError>
    {
        Ok(self
            .get(key)?
            .is_some())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Process-local store, used by tests and one-shot runs
#[derive(Debug, Default)]
pub struct MemoryStore
{
    map: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore
{
    pub fn new() -> Self
    {
        Self::default()
    }
}

impl ProfileStore for MemoryStore
{
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<Value>, StoreError>
    {
        let map = self
            .map
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .get(key)
            .cloned())
    }

    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>
    {
        self.map
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<bool, StoreError>
    {
        Ok(self
            .map
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(key)
            .is_some())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError>
    {
        let map = self
            .map
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .keys()
            .cloned()
            .collect())
    }
}

/// Store persisted as one pretty-printed JSON object
#[derive(Debug)]
pub struct JsonFileStore
{
    path: PathBuf,
    map: RwLock<BTreeMap<String, Value>>,
}

impl JsonFileStore
{
    /// Open `path`, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError>
    {
        let path = path.into();
        let map = if path.is_file()
        {
            let raw = fs::read_to_string(&path)
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            if raw
                .trim()
                .is_empty()
            {
                BTreeMap::new()
            }
            else
            {
                serde_json::from_str(&raw)
                    .map_err(|source| StoreError::Corrupt { path: path.clone(), source })?
            }
        }
        else
        {
            BTreeMap::new()
        };
        debug!(path = %path.display(), records = map.len(), "Opened profile store");
        Ok(Self { path, map: RwLock::new(map) })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    fn persist(
        &self,
        map: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError>
    {
        let data = serde_json::to_vec_pretty(map)?;
        write_atomic(&self.path, &data).map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }
}

impl ProfileStore for JsonFileStore
{
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<Value>, StoreError>
    {
        let map = self
            .map
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .get(key)
            .cloned())
    }

    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>
    {
        let mut map = self
            .map
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        let mut next = map.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *map = next;
        Ok(())
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<bool, StoreError>
    {
        let mut map = self
            .map
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        if !map.contains_key(key)
        {
            return Ok(false);
        }
        let mut next = map.clone();
        next.remove(key);
        self.persist(&next)?;
        *map = next;
        Ok(true)
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError>
    {
        let map = self
            .map
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .keys()
            .cloned()
            .collect())
    }
}

/// Replace `path` with `data` via a same-directory temp file, holding an
/// advisory lock on `<path>.lock` so concurrent processes do not interleave.
fn write_atomic(
    path: &Path,
    data: &[u8],
) -> std::io::Result<()>
{
    let dir = path
        .parent()
        .filter(|p| {
            !p.as_os_str()
                .is_empty()
        })
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path.with_extension("lock"))?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file()
        .sync_all()?;

    tmp.persist(path)
        .map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;

    fn exercise(store: &dyn ProfileStore)
    {
        assert_eq!(store.get("LIKE_a_1").unwrap(), None);
        assert!(!store.exists("LIKE_a_1").unwrap());

        store.set("LIKE_a_1", json!("fp")).unwrap();
        store.set("VERSION_a", json!(1)).unwrap();
        assert!(store.exists("LIKE_a_1").unwrap());
        assert_eq!(store.get("VERSION_a").unwrap(), Some(json!(1)));
        assert_eq!(store.list_keys().unwrap(), vec!["LIKE_a_1", "VERSION_a"]);

        assert!(store.remove("LIKE_a_1").unwrap());
        assert!(!store.remove("LIKE_a_1").unwrap());
        assert_eq!(store.list_keys().unwrap(), vec!["VERSION_a"]);
    }

    #[test]
    fn memory_store_contract()
    {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn json_store_contract_and_persistence()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("nested/storage.json");

        let store = JsonFileStore::open(&path).unwrap();
        exercise(&store);
        store.set("DISLIKE_a_7", json!("fp")).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.list_keys().unwrap(), vec!["DISLIKE_a_7", "VERSION_a"]);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn failed_write_leaves_memory_untouched()
    {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir
            .path()
            .join("state");
        let store = JsonFileStore::open(sub.join("store.json")).unwrap();
        store.set("VERSION_a", json!(0)).unwrap();

        // A regular file where the store directory should be
        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, "").unwrap();

        assert!(matches!(store.set("LIKE_a_1", json!("fp")), Err(StoreError::Io { .. })));
        assert_eq!(store.get("LIKE_a_1").unwrap(), None);

        assert!(matches!(store.remove("VERSION_a"), Err(StoreError::Io { .. })));
        assert_eq!(store.get("VERSION_a").unwrap(), Some(json!(0)));
        assert_eq!(store.list_keys().unwrap(), vec!["VERSION_a"]);
    }

    #[test]
    fn corrupt_file_is_reported()
    {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "{not json").unwrap();
        let err = JsonFileStore::open(file.path()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
