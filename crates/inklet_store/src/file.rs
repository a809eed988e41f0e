//! File-based store for persistent storage.

use crate::error::{StoreError, StoreOp, StoreResult};
use crate::store::PersistentStore;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-based key/value store.
///
/// Each key maps to one file inside a root directory. Data survives process
/// restarts. Writes go to a temporary file first and are renamed into place,
/// so a crash mid-write never leaves a torn value behind.
///
/// # Thread Safety
///
/// This store is thread-safe; a single internal lock serializes writes.
///
/// # Example
///
/// ```no_run
/// use inklet_store::{FileStore, PersistentStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data")).unwrap();
/// store.set("sync/queue", b"[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a file store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)
            .map_err(|e| StoreError::io(StoreOp::Set, root.to_string_lossy(), e))?;
        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key must not be empty".to_string(),
            });
        }
        Ok(self.root.join(encode_key(key)))
    }
}

/// Encodes a key into a file name.
///
/// Alphanumerics and `.`/`_`/`-` pass through; every other byte becomes
/// `%XX`, so distinct keys always map to distinct file names.
fn encode_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                name.push(byte as char);
            }
            _ => {
                name.push('%');
                name.push_str(&format!("{byte:02X}"));
            }
        }
    }
    name
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(StoreOp::Get, key, e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();

        // Encoded names never contain '~', so the scratch file cannot
        // collide with another key's final file.
        let mut tmp = path.clone().into_os_string();
        tmp.push("~");
        let tmp = PathBuf::from(tmp);
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| StoreError::io(StoreOp::Set, key, e))
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(StoreOp::Remove, key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("store");

        let store = FileStore::open(&root).unwrap();
        assert!(root.exists());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn file_set_then_get() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("sync/queue", b"[1,2]").unwrap();
        assert_eq!(store.get("sync/queue").unwrap(), Some(b"[1,2]".to_vec()));
    }

    #[test]
    fn file_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn file_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("a", b"1").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        store.remove("a").unwrap();
    }

    #[test]
    fn file_persistence_across_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set("sync/last_synced_at", b"\"2026-01-01T00:00:00Z\"").unwrap();
        }

        {
            let store = FileStore::open(dir.path()).unwrap();
            assert_eq!(
                store.get("sync/last_synced_at").unwrap(),
                Some(b"\"2026-01-01T00:00:00Z\"".to_vec())
            );
        }
    }

    #[test]
    fn file_empty_key_rejected() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let err = store.set("", b"x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[test]
    fn distinct_keys_map_to_distinct_files() {
        assert_ne!(encode_key("a/b"), encode_key("a%2Fb"));
        assert_ne!(encode_key("a/b"), encode_key("a_b"));
        assert_eq!(encode_key("plain-key_1.json"), "plain-key_1.json");
    }
}
