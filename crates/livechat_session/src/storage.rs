//! Persistent local store
//!
//! A small string key/value store that survives restarts. The session core
//! keeps exactly two keys per deployment token in it.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Key/value string storage.
///
/// Implementations must be cheap enough to call while handling a UI action;
/// the core calls them synchronously.
#[cfg_attr(test, mockall::automock)]
pub trait LocalStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written or was removed.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// File-based store: one `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    base_path: PathBuf,
}

impl FileLocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys embed the deployment token, which may contain characters that are
/// not valid in file names.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.base_path)?;

        // Write to a sibling file first so a crash never leaves half a value.
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.key_path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// In-memory store. Clones share the same map, so a test can hand one clone
/// to a core, drop it and build a second core over the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_set_get_remove() {
        let dir = tempdir().unwrap();
        let store = FileLocalStore::new(dir.path().join("store"));

        assert_eq!(store.get("livechat_abc_user").unwrap(), None);
        store.set("livechat_abc_user", r#"{"id":7}"#).unwrap();
        assert_eq!(
            store.get("livechat_abc_user").unwrap().as_deref(),
            Some(r#"{"id":7}"#)
        );

        store.remove("livechat_abc_user").unwrap();
        assert_eq!(store.get("livechat_abc_user").unwrap(), None);
        store.remove("livechat_abc_user").unwrap();
    }

    #[test]
    fn test_file_store_overwrites() {
        let dir = tempdir().unwrap();
        let store = FileLocalStore::new(dir.path());

        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempdir().unwrap();
        let store = FileLocalStore::new(dir.path());

        store.set("livechat_a/b:c_user", "x").unwrap();
        assert!(dir.path().join("livechat_a_b_c_user.json").exists());
        assert_eq!(store.get("livechat_a/b:c_user").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryLocalStore::new();
        let other = store.clone();

        store.set("k", "v").unwrap();
        assert!(other.contains("k"));
        other.remove("k").unwrap();
        assert!(store.is_empty());
    }
}
