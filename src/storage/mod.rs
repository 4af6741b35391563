//! Best-effort key/value persistence.
//!
//! [`Storage`] JSON-encodes values over a [`KeyValueBackend`]. Faults are
//! logged and swallowed: `set`/`remove` report success as a boolean and
//! `get` yields `None`.

pub mod backend;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueBackend>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|encoded| self.backend.set_raw(key, &encoded));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Storage error");
                false
            }
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_raw(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Storage error");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Storage error");
                None
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.backend.remove_raw(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Storage error");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenBackend;

    impl KeyValueBackend for BrokenBackend {
        fn get_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota".into()))
        }
        fn set_raw(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota".into()))
        }
        fn remove_raw(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota".into()))
        }
    }

    #[test]
    fn test_set_get_remove() {
        let storage = Storage::in_memory();
        assert!(storage.set("theme", "dark"));
        assert_eq!(storage.get::<String>("theme").as_deref(), Some("dark"));
        assert!(storage.set("prefs", &serde_json::json!({"n": 3})));
        assert_eq!(
            storage.get::<serde_json::Value>("prefs"),
            Some(serde_json::json!({"n": 3}))
        );
        assert!(storage.remove("theme"));
        assert_eq!(storage.get::<String>("theme"), None);
    }

    #[test]
    fn test_faults_are_swallowed() {
        let storage = Storage::new(Arc::new(BrokenBackend));
        assert!(!storage.set("k", &1));
        assert_eq!(storage.get::<i32>("k"), None);
        assert!(!storage.remove("k"));
    }

    #[test]
    fn test_undecodable_value_reads_as_absent() {
        let backend = Arc::new(MemoryBackend::default());
        backend.set_raw("k", "not json").unwrap();
        let storage = Storage::new(backend);
        assert_eq!(storage.get::<String>("k"), None);
    }
}
