//! DummyJSON catalog client
//!
//! Listings are wrapped as `{"products": [...], "total": n, ...}` and the
//! image lives in `thumbnail`. Search is native (`/products/search?q=`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{push_segment, validated, CatalogProvider, CatalogQuery, Product};
use crate::config::CatalogConfig;
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

const SERVICE_NAME: &str = "dummyjson";

#[derive(Debug, Deserialize)]
struct ProductPage {
    products: Vec<DummyJsonProduct>,
}

#[derive(Debug, Deserialize)]
struct DummyJsonProduct {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    category: String,
}

impl From<DummyJsonProduct> for Product {
    fn from(p: DummyJsonProduct) -> Self {
        Product {
            id: p.id,
            title: p.title,
            description: p.description,
            price: p.price,
            thumbnail: p.thumbnail,
            category: p.category,
        }
    }
}

/// Client for the DummyJSON products API
pub struct DummyJsonClient {
    http_client: Client,
    base_url: url::Url,
    config: CatalogConfig,
}

impl DummyJsonClient {
    /// Create a client from a catalog configuration
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| ServiceError::configuration(format!("Invalid DummyJSON base URL: {}", e)))?;
        let http_client = build_http_client(Some(UserAgent::for_client("dummyjson-client")), Some(config.timeout()))?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    fn request_for(&self, query: &CatalogQuery) -> Result<(String, reqwest::RequestBuilder)> {
        let (url, params): (url::Url, Vec<(&str, String)>) = match query {
            CatalogQuery::All => (
                push_segment(&self.base_url, &["products"])?,
                vec![("limit", self.config.page_size.to_string())],
            ),
            CatalogQuery::Category(category) => (
                push_segment(&self.base_url, &["products", "category", category.as_str()])?,
                Vec::new(),
            ),
            CatalogQuery::Text(text) => (
                push_segment(&self.base_url, &["products", "search"])?,
                vec![("q", text.clone())],
            ),
        };

        let endpoint = url.path().to_string();
        let mut request = self.http_client.get(url).query(&params);
        if let Some(ref api_key) = self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        Ok((endpoint, request))
    }
}

#[async_trait]
impl CatalogProvider for DummyJsonClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn supports_native_search(&self) -> bool {
        true
    }

    async fn list_products(&self, query: &CatalogQuery) -> Result<Vec<Product>> {
        let (endpoint, request) = self.request_for(query)?;
        let page: ProductPage = send_json(SERVICE_NAME, &endpoint, request).await?;

        debug!(%query, count = page.products.len(), "fetched DummyJSON products");
        validated(SERVICE_NAME, page.products.into_iter().map(Product::from).collect())
    }
}
