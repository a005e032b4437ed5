//! In-memory store for tests and previews.

use std::sync::{Mutex, PoisonError};

use crate::error::{StoreError, StoreResult};
use crate::record::{RecordMap, StoreValue};
use crate::{PreferencesStore, StorageHandle};

/// Volatile [`PreferencesStore`] with the same typing and lifecycle behavior
/// as [`FileStore`](crate::FileStore), minus the disk.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    entries: RecordMap,
    closed: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
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
        Ok(())
    }
}

impl PreferencesStore for MemoryStore {
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
        state.entries.remove(key);
        Ok(())
    }

    fn clear_all(&self) -> StoreResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }
        state.entries.clear();
        Ok(())
    }
}

impl StorageHandle for MemoryStore {
    fn close(&self) -> StoreResult<()> {
        self.lock().closed = true;
        Ok(())
    }

    fn delete_backing_file(&self) -> StoreResult<()> {
        self.lock().entries.clear();
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        self.lock().closed = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behaves_like_a_store() {
        let store = MemoryStore::new();
        store.set_string("k", "v").unwrap();
        assert_eq!(store.get_string("k", "").unwrap(), "v");
        assert!(store.contains("k").unwrap());

        store.close().unwrap();
        assert!(matches!(store.get_string("k", ""), Err(StoreError::Closed)));
        store.reset().unwrap();
        assert_eq!(store.get_string("k", "").unwrap(), "v");

        store.delete_backing_file().unwrap();
        assert!(!store.contains("k").unwrap());
    }
}
