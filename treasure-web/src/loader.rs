//! Catalog loading for the browser.

use treasure_core::{Catalog, CatalogError, CatalogLoader};

use crate::dom;

/// Web-specific loader serving the catalog compiled into the module.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebCatalogLoader;

#[derive(Debug, thiserror::Error)]
pub enum WebCatalogError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid catalog: {0}")]
    Invalid(#[from] CatalogError),
}

impl CatalogLoader for WebCatalogLoader {
    type Error = WebCatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(Catalog::embedded()?)
    }
}

/// Fetch a catalog published next to the page.
///
/// # Errors
///
/// Returns an error if the request fails or the document is not a
/// consistent catalog.
#[allow(clippy::future_not_send)]
pub async fn fetch_catalog(url: &str) -> Result<Catalog, WebCatalogError> {
    let text = dom::fetch_text(url)
        .await
        .map_err(|err| WebCatalogError::Network(dom::js_error_message(&err)))?;
    let catalog = Catalog::from_json(&text)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Fetch `url` when given, falling back to the embedded catalog on any
/// failure.
///
/// # Errors
///
/// Returns an error only if the embedded catalog itself is unusable.
#[allow(clippy::future_not_send)]
pub async fn fetch_catalog_or_embedded(url: Option<&str>) -> Result<Catalog, WebCatalogError> {
    if let Some(url) = url {
        match fetch_catalog(url).await {
            Ok(catalog) => return Ok(catalog),
            Err(err) => log::warn!("using embedded catalog, {url} failed: {err}"),
        }
    }
    WebCatalogLoader.load_catalog()
}
