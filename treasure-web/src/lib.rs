#![forbid(unsafe_code)]
//! Browser bindings for the treasure hunt.
//!
//! Wires `treasure-core` to `localStorage`, the page's catalog and the
//! browser console, and exposes the result to the hunt pages through
//! `wasm-bindgen`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod bindings;
pub mod dom;
pub mod loader;
pub mod storage;

pub use bindings::HuntHandle;
pub use loader::{WebCatalogError, WebCatalogLoader, fetch_catalog, fetch_catalog_or_embedded};
pub use storage::{BrowserStorage, WebStorageError};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A second module instance on the page finds the logger already set.
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("treasure hunt bindings ready");
}
