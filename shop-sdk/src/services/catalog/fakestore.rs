//! FakeStore catalog client
//!
//! Listings are bare JSON arrays and the image lives in `image`. There is no
//! search endpoint, so text queries are rejected and callers scan a full
//! listing instead.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{push_segment, validated, CatalogProvider, CatalogQuery, Product};
use crate::config::CatalogConfig;
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

const SERVICE_NAME: &str = "fakestore";

#[derive(Debug, Deserialize)]
struct FakeStoreProduct {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    image: String,
    #[serde(default)]
    category: String,
}

impl From<FakeStoreProduct> for Product {
    fn from(p: FakeStoreProduct) -> Self {
        Product {
            id: p.id,
            title: p.title,
            description: p.description,
            price: p.price,
            thumbnail: p.image,
            category: p.category,
        }
    }
}

/// Client for the FakeStore products API
pub struct FakeStoreClient {
    http_client: Client,
    base_url: url::Url,
    config: CatalogConfig,
}

impl FakeStoreClient {
    /// Create a client from a catalog configuration
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| ServiceError::configuration(format!("Invalid FakeStore base URL: {}", e)))?;
        let http_client = build_http_client(Some(UserAgent::for_client("fakestore-client")), Some(config.timeout()))?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }
}

#[async_trait]
impl CatalogProvider for FakeStoreClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn supports_native_search(&self) -> bool {
        false
    }

    async fn list_products(&self, query: &CatalogQuery) -> Result<Vec<Product>> {
        let url = match query {
            CatalogQuery::All => push_segment(&self.base_url, &["products"])?,
            CatalogQuery::Category(category) => push_segment(&self.base_url, &["products", "category", category.as_str()])?,
            CatalogQuery::Text(_) => {
                return Err(ServiceError::unsupported("FakeStore has no search endpoint"));
            }
        };

        let endpoint = url.path().to_string();
        let mut request = self.http_client.get(url);
        if let Some(ref api_key) = self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let products: Vec<FakeStoreProduct> = send_json(SERVICE_NAME, &endpoint, request).await?;

        debug!(%query, count = products.len(), "fetched FakeStore products");
        validated(SERVICE_NAME, products.into_iter().map(Product::from).collect())
    }
}
