//! Key-value storage seam.
//!
//! Mirrors the browser `Storage` API so the web crate can plug
//! `localStorage` in directly while tests and the tester use
//! [`MemoryStorage`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Storage key of the progress record (shared with the existing site pages).
pub const PROGRESS_KEY: &str = "chasseTresor";

/// Storage key of the final-challenge story draft.
pub const DRAFT_KEY: &str = "storyDraft";

/// Trait for abstracting durable string storage.
/// Platform-specific implementations should provide this.
pub trait KeyValueStorage {
    type Error: std::error::Error + 'static;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected (quota, disabled storage).
    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the removal.
    fn remove_item(&self, key: &str) -> Result<(), Self::Error>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    type Error = S::Error;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove_item(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage write rejected: {0}")]
    WriteRejected(String),
}

/// In-memory storage. Clones share the same entries, which lets a test
/// hand one handle to a store and inspect or reload through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    read_only: bool,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that serves reads but rejects every write, like a browser
    /// whose quota is exhausted.
    #[must_use]
    pub fn read_only(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            read_only: true,
        }
    }

    /// Raw value under `key`, bypassing the trait.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Overwrite `key` with arbitrary text, bypassing the trait.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStorage for MemoryStorage {
    type Error = StorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        if self.read_only {
            return Err(StorageError::WriteRejected(format!("{key} is read-only")));
        }
        self.put_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        if self.read_only {
            return Err(StorageError::WriteRejected(format!("{key} is read-only")));
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Storage with no backend at all (private browsing with storage disabled).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl KeyValueStorage for UnavailableStorage {
    type Error = StorageError;

    fn get_item(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Err(StorageError::Unavailable("no storage backend".into()))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), Self::Error> {
        Err(StorageError::Unavailable("no storage backend".into()))
    }

    fn remove_item(&self, _key: &str) -> Result<(), Self::Error> {
        Err(StorageError::Unavailable("no storage backend".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").unwrap().as_deref(), Some("v"));
        other.remove_item("k").unwrap();
        assert!(storage.raw("k").is_none());
    }

    #[test]
    fn read_only_view_rejects_writes_but_reads() {
        let storage = MemoryStorage::new();
        storage.put_raw("k", "v");
        let frozen = storage.read_only();
        assert_eq!(frozen.get_item("k").unwrap().as_deref(), Some("v"));
        assert!(frozen.set_item("k", "w").is_err());
        assert!(frozen.remove_item("k").is_err());
        assert_eq!(storage.raw("k").as_deref(), Some("v"));
    }

    #[test]
    fn unavailable_storage_errors_everywhere() {
        let storage = UnavailableStorage;
        assert!(storage.get_item("k").is_err());
        assert!(storage.set_item("k", "v").is_err());
        assert!(storage.remove_item("k").is_err());
    }
}
