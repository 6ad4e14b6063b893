//! `localStorage` adapter for the core storage seam.

use treasure_core::KeyValueStorage;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("localStorage unavailable")]
    Unavailable,
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<JsValue> for WebStorageError {
    fn from(value: JsValue) -> Self {
        Self::Storage(dom::js_error_message(&value))
    }
}

/// Browser storage. Holds no handle when `localStorage` is disabled, in
/// which case every call fails and the stores fall back to memory.
#[derive(Debug, Clone, Default)]
pub struct BrowserStorage {
    inner: Option<Storage>,
}

impl BrowserStorage {
    /// Wrap the page's `localStorage`, logging why it is missing if so.
    #[must_use]
    pub fn local() -> Self {
        match dom::local_storage() {
            Ok(storage) => Self::from_storage(storage),
            Err(err) => {
                log::warn!(
                    "localStorage unavailable, progress will not persist: {}",
                    dom::js_error_message(&err)
                );
                Self::detached()
            }
        }
    }

    #[must_use]
    pub const fn from_storage(storage: Storage) -> Self {
        Self {
            inner: Some(storage),
        }
    }

    /// Storage with no backend.
    #[must_use]
    pub const fn detached() -> Self {
        Self { inner: None }
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    fn handle(&self) -> Result<&Storage, WebStorageError> {
        self.inner.as_ref().ok_or(WebStorageError::Unavailable)
    }
}

impl KeyValueStorage for BrowserStorage {
    type Error = WebStorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.handle()?.get_item(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        Ok(self.handle()?.set_item(key, value)?)
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        Ok(self.handle()?.remove_item(key)?)
    }
}
