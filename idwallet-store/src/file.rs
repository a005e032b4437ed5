//! Encrypted file-backed preferences store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::crypto::{self, StoreKey};
use crate::error::{StoreError, StoreResult};
use crate::record::{
    deserialize_map, serialize_map, RecordMap, SealedRecord, StoreValue,
};
use crate::{PreferencesStore, StorageHandle};

/// Preferences store sealed as a single encrypted file.
///
/// Every mutation re-seals the whole record map and replaces the file with an
/// atomic rename, so a crash mid-write leaves either the old or the new
/// contents, never a torn file.
pub struct FileStore {
    path: PathBuf,
    key: StoreKey,
    state: Mutex<State>,
}

struct State {
    entries: RecordMap,
    closed: bool,
}

impl FileStore {
    /// Opens the store at `path`, creating an empty one if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read, decrypted, or
    /// parsed.
    pub fn open(path: impl AsRef<Path>, key: StoreKey) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = Self::load(&path, &key)?;
        Ok(Self {
            path,
            key,
            state: Mutex::new(State {
                entries,
                closed: false,
            }),
        })
    }

    fn load(path: &Path, key: &StoreKey) -> StoreResult<RecordMap> {
        if !path.exists() {
            return Ok(RecordMap::new());
        }
        let bytes = fs::read(path)?;
        let record = SealedRecord::deserialize(&bytes)?;
        let plaintext = crypto::open(key, &record.nonce, &record.ciphertext)?;
        deserialize_map(&plaintext)
    }

    fn flush(&self, entries: &RecordMap) -> StoreResult<()> {
        let plaintext = serialize_map(entries)?;
        let (ciphertext, nonce) = crypto::seal(&self.key, &plaintext)?;
        let bytes = SealedRecord::new(nonce, ciphertext).serialize()?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(
        &self,
        key: &str,
        expected: &'static str,
        extract: impl FnOnce(&StoreValue) -> Option<T>,
        default: T,
    ) -> StoreResult<T> {
        let state = self.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        match state.entries.get(key) {
            None => Ok(default),
            Some(value) => extract(value).ok_or_else(|| StoreError::TypeMismatch {
                key: key.to_owned(),
                expected,
            }),
        }
    }

    fn write(&self, key: &str, value: StoreValue) -> StoreResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        state.entries.insert(key.to_owned(), value);
        self.flush(&state.entries)
    }
}

impl PreferencesStore for FileStore {
    fn get_string(&self, key: &str, default: &str) -> StoreResult<String> {
        self.read(
            key,
            "string",
            |v| match v {
                StoreValue::Str(s) => Some(s.clone()),
                _ => None,
            },
            default.to_owned(),
        )
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write(key, StoreValue::Str(value.to_owned()))
    }

    fn get_bool(&self, key: &str, default: bool) -> StoreResult<bool> {
        self.read(
            key,
            "bool",
            |v| match v {
                StoreValue::Bool(b) => Some(*b),
                _ => None,
            },
            default,
        )
    }

    fn set_bool(&self, key: &str, value: bool) -> StoreResult<()> {
        self.write(key, StoreValue::Bool(value))
    }

    fn get_int(&self, key: &str, default: i32) -> StoreResult<i32> {
        self.read(
            key,
            "int",
            |v| match v {
                StoreValue::Int(i) => Some(*i),
                _ => None,
            },
            default,
        )
    }

    fn set_int(&self, key: &str, value: i32) -> StoreResult<()> {
        self.write(key, StoreValue::Int(value))
    }

    fn get_long(&self, key: &str, default: i64) -> StoreResult<i64> {
        self.read(
            key,
            "long",
            |v| match v {
                StoreValue::Long(l) => Some(*l),
                _ => None,
            },
            default,
        )
    }

    fn set_long(&self, key: &str, value: i64) -> StoreResult<()> {
        self.write(key, StoreValue::Long(value))
    }

    fn contains(&self, key: &str) -> StoreResult<bool> {
        let state = self.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(state.entries.contains_key(key))
    }

    fn clear(&self, key: &str) -> StoreResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        if state.entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&state.entries)
    }

    fn clear_all(&self) -> StoreResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        state.entries.clear();
        self.flush(&state.entries)
    }
}

impl StorageHandle for FileStore {
    fn close(&self) -> StoreResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        self.flush(&state.entries)?;
        state.entries.clear();
        state.closed = true;
        debug!(path = %self.path.display(), "preferences store closed");
        Ok(())
    }

    fn delete_backing_file(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn reset(&self) -> StoreResult<()> {
        let mut state = self.lock();
        state.entries = Self::load(&self.path, &self.key)?;
        state.closed = false;
        debug!(path = %self.path.display(), "preferences store reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(format!("{}.prefs", Uuid::new_v4()));
        let store = FileStore::open(path, StoreKey::from_bytes([3u8; 32])).expect("open");
        (dir, store)
    }

    #[test]
    fn test_typed_round_trips_and_defaults() {
        let (_dir, store) = temp_store();

        assert_eq!(store.get_string("name", "fallback").unwrap(), "fallback");
        store.set_string("name", "pid-wallet").unwrap();
        assert_eq!(store.get_string("name", "fallback").unwrap(), "pid-wallet");

        store.set_bool("flag", true).unwrap();
        assert!(store.get_bool("flag", false).unwrap());

        store.set_int("attempts", 3).unwrap();
        assert_eq!(store.get_int("attempts", 0).unwrap(), 3);

        store.set_long("deadline", 1 << 41).unwrap();
        assert_eq!(store.get_long("deadline", 0).unwrap(), 1 << 41);

        assert!(store.contains("name").unwrap());
        store.clear("name").unwrap();
        assert!(!store.contains("name").unwrap());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let (_dir, store) = temp_store();
        store.set_bool("k", true).unwrap();
        assert!(matches!(
            store.get_string("k", ""),
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wallet.prefs");
        let key = StoreKey::from_bytes([5u8; 32]);

        let store = FileStore::open(&path, key.clone()).unwrap();
        store.set_string("alias", "abc123").unwrap();
        drop(store);

        let store = FileStore::open(&path, key).unwrap();
        assert_eq!(store.get_string("alias", "").unwrap(), "abc123");
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wallet.prefs");

        let store = FileStore::open(&path, StoreKey::from_bytes([1u8; 32])).unwrap();
        store.set_string("alias", "abc123").unwrap();
        drop(store);

        assert!(FileStore::open(&path, StoreKey::from_bytes([2u8; 32])).is_err());
    }

    #[test]
    fn test_close_delete_reset_lifecycle() {
        let (_dir, store) = temp_store();
        store.set_string("alias", "abc").unwrap();

        store.close().unwrap();
        assert!(matches!(store.get_string("alias", ""), Err(StoreError::Closed)));
        assert!(matches!(store.set_bool("x", true), Err(StoreError::Closed)));

        // Idempotent close, idempotent delete.
        store.close().unwrap();
        store.delete_backing_file().unwrap();
        store.delete_backing_file().unwrap();

        store.reset().unwrap();
        assert_eq!(store.get_string("alias", "gone").unwrap(), "gone");
        store.set_string("alias", "fresh").unwrap();
        assert_eq!(store.get_string("alias", "").unwrap(), "fresh");
    }

    #[test]
    fn test_clear_all_removes_everything() {
        let (_dir, store) = temp_store();
        store.set_string("a", "1").unwrap();
        store.set_int("b", 2).unwrap();
        store.clear_all().unwrap();
        assert!(!store.contains("a").unwrap());
        assert!(!store.contains("b").unwrap());
    }
}
