//! Gateway configuration
//!
//! Everything is read once at startup from a [`ConfigProvider`] (environment
//! variables in production, in-memory maps in tests) and handed to
//! [`crate::gateway::ShopGateway`] as plain values.

use std::net::SocketAddr;
use std::time::Duration;

use shop_sdk::config::{CatalogConfig, CatalogFlavor, ConfigProvider, ConfigProviderExt};
use shop_sdk::{RetryPolicy, ServiceError};

use crate::search::SearchScope;

/// Default HTTP port, matching the storefront's proxy settings
pub const DEFAULT_PORT: u16 = 3001;

/// Default number of recommended products
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 4;

/// Largest `count` a caller may ask recommendations for
pub const MAX_RECOMMENDATION_COUNT: usize = 50;

/// Default deadline for one gateway operation including retries
pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind host, or a full `host:port` address
    pub bind_addr: String,

    pub port: u16,

    /// Upper bound for one catalog call or chat generation, retries included
    pub request_deadline: Duration,

    pub recommendation_count: usize,

    /// Fixed seed for the recommendation sampler; entropy when absent
    pub recommendation_seed: Option<u64>,

    pub search_scope: SearchScope,

    /// Primary catalog behind `/api/products`
    pub catalog: CatalogConfig,

    /// Secondary catalog behind `/api/v1/products`, only mounted when set
    pub legacy_catalog: Option<CatalogConfig>,

    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            recommendation_seed: None,
            search_scope: SearchScope::default(),
            catalog: CatalogConfig::default(),
            legacy_catalog: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// Load the gateway configuration
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self, ServiceError> {
        let defaults = Self::default();

        let port = u16::try_from(provider.get_u64_or("port", DEFAULT_PORT as u64)?)
            .map_err(|_| ServiceError::configuration("PORT is out of range"))?;

        let request_deadline = Duration::from_millis(
            provider.get_u64_or("request_deadline_ms", DEFAULT_REQUEST_DEADLINE.as_millis() as u64)?,
        );
        if request_deadline.is_zero() {
            return Err(ServiceError::configuration("REQUEST_DEADLINE_MS must be positive"));
        }

        let recommendation_count =
            provider.get_u64_or("recommendation_count", DEFAULT_RECOMMENDATION_COUNT as u64)? as usize;
        if recommendation_count == 0 || recommendation_count > MAX_RECOMMENDATION_COUNT {
            return Err(ServiceError::configuration(format!(
                "RECOMMENDATION_COUNT must be between 1 and {}",
                MAX_RECOMMENDATION_COUNT
            )));
        }

        let recommendation_seed = match provider.get_non_empty("recommendation_seed") {
            Some(_) => Some(provider.get_u64_or("recommendation_seed", 0)?),
            None => None,
        };

        let search_scope = match provider.get_non_empty("search_scope") {
            Some(value) => value.parse()?,
            None => defaults.search_scope,
        };

        let legacy_catalog = match provider.get_non_empty("legacy_catalog_provider") {
            Some(_) => Some(CatalogConfig::from_provider_with_prefix(
                provider,
                "legacy_catalog",
                CatalogFlavor::FakeStore,
            )?),
            None => None,
        };

        Ok(Self {
            bind_addr: provider.get_string_or("bind_addr", &defaults.bind_addr),
            port,
            request_deadline,
            recommendation_count,
            recommendation_seed,
            search_scope,
            catalog: CatalogConfig::from_provider(provider)?,
            legacy_catalog,
            retry: RetryPolicy::from_provider(provider)?,
        })
    }

    /// Socket address to listen on
    ///
    /// `BIND_ADDR` may be a bare host (combined with `PORT`), a full
    /// `host:port`, or an `http://host:port` URL.
    pub fn bind_address(&self) -> Result<SocketAddr, ServiceError> {
        let addr = self
            .bind_addr
            .trim_start_matches("http://")
            .trim_start_matches("https://");

        if let Ok(addr) = addr.parse::<SocketAddr>() {
            return Ok(addr);
        }

        format!("{}:{}", addr, self.port)
            .parse()
            .map_err(|e| ServiceError::configuration(format!("Invalid bind address {}: {}", self.bind_addr, e)))
    }
}
