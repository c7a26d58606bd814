//! Upstream product catalog clients
//!
//! Two public catalog APIs are supported behind one [`CatalogProvider`]
//! trait: DummyJSON, which wraps listings and offers native search, and
//! FakeStore, which returns bare arrays and has no search endpoint. Both
//! normalize their payloads to [`Product`].

mod dummyjson;
mod fakestore;

pub use dummyjson::DummyJsonClient;
pub use fakestore::FakeStoreClient;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{CatalogConfig, CatalogFlavor};
use crate::error::{Result, ServiceError};

/// A product as exposed to the gateway's callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Provider-assigned identifier, unique within one catalog
    pub id: u64,

    pub title: String,

    /// Free-text description; empty when the provider has none
    #[serde(default)]
    pub description: String,

    /// Unit price, always finite and non-negative
    pub price: f64,

    /// Image URI
    pub thumbnail: String,

    pub category: String,
}

impl Product {
    /// Check the product invariants
    pub fn validate(&self) -> Result<()> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ServiceError::malformed(format!(
                "product {} has an invalid price: {}",
                self.id, self.price
            )));
        }

        Ok(())
    }
}

/// What a catalog listing should contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// Plain listing
    All,
    /// Products of one category
    Category(String),
    /// Products matching a free-text query
    Text(String),
}

impl CatalogQuery {
    /// Build a query from optional request parameters
    ///
    /// Blank parameters count as absent. When both a category and a text
    /// query are given the category wins and the text is dropped.
    pub fn from_parts(category: Option<&str>, text: Option<&str>) -> Self {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let text = text.map(str::trim).filter(|t| !t.is_empty());

        match (category, text) {
            (Some(category), Some(text)) => {
                warn!(category, query = text, "both category and query given, using category");
                CatalogQuery::Category(category.to_string())
            }
            (Some(category), None) => CatalogQuery::Category(category.to_string()),
            (None, Some(text)) => CatalogQuery::Text(text.to_string()),
            (None, None) => CatalogQuery::All,
        }
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogQuery::All => write!(f, "all"),
            CatalogQuery::Category(category) => write!(f, "category={}", category),
            CatalogQuery::Text(text) => write!(f, "q={}", text),
        }
    }
}

/// A read-only product catalog
///
/// Implementations make exactly one upstream call per `list_products` and
/// never retry; retrying is up to the caller.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Provider name used in logs and health output
    fn name(&self) -> &str;

    /// Whether `CatalogQuery::Text` is answered by the provider itself
    fn supports_native_search(&self) -> bool;

    /// Fetch the products matching `query`, in provider order
    async fn list_products(&self, query: &CatalogQuery) -> Result<Vec<Product>>;
}

/// Build the catalog client for a configuration
pub fn catalog_client(config: CatalogConfig) -> Result<Arc<dyn CatalogProvider>> {
    Ok(match config.flavor {
        CatalogFlavor::DummyJson => Arc::new(DummyJsonClient::new(config)?),
        CatalogFlavor::FakeStore => Arc::new(FakeStoreClient::new(config)?),
    })
}

/// Validate every product of a freshly decoded listing
fn validated(service: &str, products: Vec<Product>) -> Result<Vec<Product>> {
    for product in &products {
        product
            .validate()
            .map_err(|e| e.with_context_value("service", service))?;
    }
    Ok(products)
}

/// Append a percent-encoded path segment to `base`
fn push_segment(base: &url::Url, segments: &[&str]) -> Result<url::Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ServiceError::configuration(format!("Catalog base URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
