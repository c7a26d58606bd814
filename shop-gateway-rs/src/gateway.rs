//! Gateway core
//!
//! [`ShopGateway`] owns the upstream clients and the only mutable state of
//! the service: the conversation log and the recommendation random source.
//! HTTP handlers in `lib.rs` are thin wrappers around its methods.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shop_sdk::catalog::catalog_client;
use shop_sdk::{CatalogProvider, CatalogQuery, Product, RetryExecutor, ServiceError, TextGenerator};
use tracing::{debug, info};

use crate::chat::{ChatEntry, ChatReply, ChatResponder, ConversationLog};
use crate::config::{GatewayConfig, MAX_RECOMMENDATION_COUNT};
use crate::error::{GatewayError, Result};
use crate::recommend::recommend;
use crate::search::{SearchResolver, SearchScope};

/// Which configured catalog a request is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// `/api/products`
    Primary,
    /// `/api/v1/products`
    Legacy,
}

struct CatalogRoute {
    provider: Arc<dyn CatalogProvider>,
    search: SearchResolver,
}

pub struct ShopGateway {
    primary: CatalogRoute,
    legacy: Option<CatalogRoute>,
    retry: RetryExecutor,
    deadline: Duration,
    chat: ChatResponder,
    log: ConversationLog,
    // Never held across an await
    rng: Mutex<StdRng>,
    recommendation_count: usize,
}

impl ShopGateway {
    /// Assemble a gateway from already built upstream clients
    pub fn new(
        config: &GatewayConfig,
        catalog: Arc<dyn CatalogProvider>,
        legacy: Option<Arc<dyn CatalogProvider>>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let retry = RetryExecutor::new(config.retry.clone());
        let rng = match config.recommendation_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            primary: CatalogRoute {
                provider: catalog,
                search: SearchResolver::new(config.search_scope),
            },
            // The secondary catalog always searches every text field
            legacy: legacy.map(|provider| CatalogRoute {
                provider,
                search: SearchResolver::new(SearchScope::AllText),
            }),
            chat: ChatResponder::new(generator, retry.clone(), config.request_deadline),
            retry,
            deadline: config.request_deadline,
            log: ConversationLog::new(),
            rng: Mutex::new(rng),
            recommendation_count: config.recommendation_count,
        }
    }

    /// Build the catalog clients described by `config`
    pub fn from_config(config: &GatewayConfig, generator: Option<Arc<dyn TextGenerator>>) -> Result<Self> {
        let catalog = catalog_client(config.catalog.clone())?;
        let legacy = config.legacy_catalog.clone().map(catalog_client).transpose()?;

        info!(
            catalog = catalog.name(),
            legacy_catalog = legacy.as_ref().map(|c| c.name()).unwrap_or("none"),
            generator = generator.as_ref().map(|g| g.name()).unwrap_or("none"),
            search_scope = %config.search_scope,
            "gateway configured"
        );

        Ok(Self::new(config, catalog, legacy, generator))
    }

    pub fn catalog_name(&self) -> &str {
        self.primary.provider.name()
    }

    pub fn legacy_catalog_name(&self) -> Option<&str> {
        self.legacy.as_ref().map(|route| route.provider.name())
    }

    pub fn has_legacy_catalog(&self) -> bool {
        self.legacy.is_some()
    }

    pub fn generator_name(&self) -> Option<&'static str> {
        self.chat.generator_name()
    }

    /// Products for a listing request
    ///
    /// Text queries are answered the same way as [`ShopGateway::search`].
    pub async fn products(&self, source: CatalogSource, query: CatalogQuery) -> Result<Vec<Product>> {
        match query {
            CatalogQuery::Text(text) => self.search(source, &text).await,
            query => {
                let route = self.route(source)?;
                self.fetch(route, &query).await
            }
        }
    }

    /// Products matching `query_text`
    pub async fn search(&self, source: CatalogSource, query_text: &str) -> Result<Vec<Product>> {
        let route = self.route(source)?;
        let plan = route.search.plan(query_text, route.provider.supports_native_search())?;

        let products = self.fetch(route, &plan.catalog_query()).await?;
        let found = route.search.finish(&plan, products);

        debug!(catalog = route.provider.name(), ?plan, found = found.len(), "search resolved");
        Ok(found)
    }

    /// A random selection of distinct products
    ///
    /// `count` defaults to the configured recommendation count. Zero yields
    /// an empty list without touching the catalog.
    pub async fn recommendations(&self, count: Option<usize>) -> Result<Vec<Product>> {
        let count = count.unwrap_or(self.recommendation_count);
        if count > MAX_RECOMMENDATION_COUNT {
            return Err(GatewayError::InvalidQuery(format!(
                "count must be at most {}",
                MAX_RECOMMENDATION_COUNT
            )));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let pool = self.fetch(&self.primary, &CatalogQuery::All).await?;

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        recommend(&pool, count, &mut *rng)
    }

    /// Answer a validated chat message and record the exchange
    pub async fn chat(&self, message: &str) -> ChatReply {
        let reply = self.chat.respond(message).await;
        self.log.append_exchange(message, &reply).await;
        reply
    }

    /// Every recorded chat entry, oldest first
    pub async fn history(&self) -> Vec<ChatEntry> {
        self.log.snapshot().await
    }

    fn route(&self, source: CatalogSource) -> Result<&CatalogRoute> {
        match source {
            CatalogSource::Primary => Ok(&self.primary),
            CatalogSource::Legacy => self
                .legacy
                .as_ref()
                .ok_or_else(|| ServiceError::configuration("secondary catalog is not configured").into()),
        }
    }

    async fn fetch(&self, route: &CatalogRoute, query: &CatalogQuery) -> Result<Vec<Product>> {
        let provider = &route.provider;
        let products = self
            .retry
            .execute_within(self.deadline, || provider.list_products(query))
            .await
            .map_err(|err| err.with_context_value("query", query))?;

        debug!(catalog = provider.name(), %query, count = products.len(), "catalog fetched");
        Ok(products)
    }
}
