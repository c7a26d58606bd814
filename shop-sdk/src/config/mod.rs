//! Configuration management for upstream clients
//!
//! This module provides utilities for loading and validating configuration
//! for the catalog and generation clients, with support for environment
//! variables. Configuration is read once into plain values that are handed to
//! constructors; nothing reads the environment after startup.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::resilience::RetryPolicy;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid float for key {}: {}", key, e)))
    }

    /// Get a value that is absent or blank as `None`
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get_string(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_non_empty(key).unwrap_or_else(|| default.to_string())
    }

    /// Get an integer value with a default; a present but unparsable value is an error
    fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_non_empty(key) {
            Some(_) => self.get_int(key),
            None => Ok(default),
        }
    }

    /// Get a float value with a default; a present but unparsable value is an error
    fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get_non_empty(key) {
            Some(_) => self.get_float(key),
            None => Ok(default),
        }
    }

    /// Get a non-negative integer value with a default
    fn get_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        let value = self.get_int_or(key, default as i64)?;
        u64::try_from(value)
            .map_err(|_| ServiceError::configuration(format!("Value for key {} must not be negative", key)))
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "SHOP")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Global default configuration provider: plain environment variables,
/// e.g. `gemini_api_key` reads `GEMINI_API_KEY`
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> = Lazy::new(|| Arc::new(EnvConfigProvider::new()));

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Which upstream catalog API a catalog client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFlavor {
    /// dummyjson.com: wrapped listings, native search
    DummyJson,
    /// fakestoreapi.com: bare arrays, no search endpoint
    FakeStore,
}

impl CatalogFlavor {
    /// Stable provider name used in logs and health output
    pub fn name(&self) -> &'static str {
        match self {
            CatalogFlavor::DummyJson => "dummyjson",
            CatalogFlavor::FakeStore => "fakestore",
        }
    }

    /// Public base URL of the provider
    pub fn default_base_url(&self) -> &'static str {
        match self {
            CatalogFlavor::DummyJson => "https://dummyjson.com",
            CatalogFlavor::FakeStore => "https://fakestoreapi.com",
        }
    }
}

impl FromStr for CatalogFlavor {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dummyjson" | "dummy_json" => Ok(CatalogFlavor::DummyJson),
            "fakestore" | "fake_store" => Ok(CatalogFlavor::FakeStore),
            other => Err(ServiceError::configuration(format!("Unknown catalog provider: {}", other))),
        }
    }
}

/// Configuration for an upstream catalog provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Provider API flavour
    pub flavor: CatalogFlavor,

    /// Base URL (can be changed for proxies and tests)
    pub base_url: String,

    /// Optional API key, sent as a bearer token
    pub api_key: Option<String>,

    /// Products per plain listing; 0 asks the provider for everything
    pub page_size: u32,

    /// Timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::for_flavor(CatalogFlavor::DummyJson)
    }
}

impl CatalogConfig {
    /// Default configuration for a provider flavour
    pub fn for_flavor(flavor: CatalogFlavor) -> Self {
        Self {
            flavor,
            base_url: flavor.default_base_url().to_string(),
            api_key: None,
            page_size: 20,
            timeout_seconds: 30,
        }
    }

    /// Load the primary catalog configuration (`CATALOG_*` keys)
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Self::from_provider_with_prefix(provider, "catalog", CatalogFlavor::DummyJson)
    }

    /// Load a catalog configuration whose keys start with `prefix`
    pub fn from_provider_with_prefix<P: ConfigProvider + ?Sized>(
        provider: &P,
        prefix: &str,
        default_flavor: CatalogFlavor,
    ) -> Result<Self> {
        let key = |name: &str| format!("{}_{}", prefix, name);

        let flavor = match provider.get_non_empty(&key("provider")) {
            Some(value) => value.parse()?,
            None => default_flavor,
        };
        let base_url = provider.get_string_or(&key("base_url"), flavor.default_base_url());
        let api_key = provider.get_non_empty(&key("api_key"));
        let page_size = u32::try_from(provider.get_u64_or(&key("page_size"), 20)?)
            .map_err(|_| ServiceError::configuration("Catalog page size is too large"))?;
        let timeout_seconds = provider.get_u64_or(&key("timeout_seconds"), 30)?;

        let config = Self {
            flavor,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size,
            timeout_seconds,
        };

        config.validate()?;
        Ok(config)
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ServiceConfig for CatalogConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("Catalog base URL is required"));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ServiceError::configuration(format!(
                "Catalog base URL is not a valid URL: {}",
                self.base_url
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(ServiceError::configuration("Catalog timeout must be positive"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        self.flavor.name()
    }
}

/// Configuration for the Gemini generateContent API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Base URL (can be changed for proxies and tests)
    pub base_url: String,

    /// Timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl GeminiConfig {
    /// Load configuration from a config provider; fails when no API key is set
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let api_key = provider
            .get_non_empty("gemini_api_key")
            .ok_or_else(|| ServiceError::configuration("GEMINI_API_KEY is not set"))?;

        let config = Self {
            api_key,
            model: provider.get_string_or("gemini_model", &defaults.model),
            base_url: provider
                .get_string_or("gemini_base_url", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            timeout_seconds: provider.get_u64_or("gemini_timeout_seconds", defaults.timeout_seconds)?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for GeminiConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::configuration("Gemini API key is required"));
        }

        if self.base_url.is_empty() || self.model.is_empty() {
            return Err(ServiceError::configuration("Gemini base URL and model are required"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "gemini"
    }
}

/// Configuration for an OpenAI-compatible chat completions API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key
    pub api_key: String,

    /// Organization ID (optional)
    pub org_id: Option<String>,

    /// Base URL (can be changed for proxies)
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Completion length limit
    pub max_tokens: u32,

    /// Timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            org_id: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            timeout_seconds: 30,
        }
    }
}

impl OpenAIConfig {
    /// Load configuration from a config provider; fails when no API key is set
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();
        let api_key = provider
            .get_non_empty("openai_api_key")
            .ok_or_else(|| ServiceError::configuration("OPENAI_API_KEY is not set"))?;
        let max_tokens = u32::try_from(provider.get_u64_or("openai_max_tokens", defaults.max_tokens as u64)?)
            .map_err(|_| ServiceError::configuration("OPENAI_MAX_TOKENS is too large"))?;

        let config = Self {
            api_key,
            org_id: provider.get_non_empty("openai_org_id"),
            base_url: provider
                .get_string_or("openai_base_url", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            model: provider.get_string_or("openai_model", &defaults.model),
            max_tokens,
            timeout_seconds: provider.get_u64_or("openai_timeout_seconds", defaults.timeout_seconds)?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for OpenAIConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ServiceError::configuration("OpenAI API key is required"));
        }

        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("OpenAI base URL is required"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "openai"
    }
}

impl RetryPolicy {
    /// Load a retry policy from `RETRY_*` keys, falling back to the defaults
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = RetryPolicy::default();
        let max_attempts = u32::try_from(provider.get_u64_or("retry_max_attempts", defaults.max_attempts as u64)?)
            .map_err(|_| ServiceError::configuration("RETRY_MAX_ATTEMPTS is too large"))?;

        let policy = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(
                provider.get_u64_or("retry_base_delay_ms", defaults.base_delay.as_millis() as u64)?,
            ),
            multiplier: provider.get_float_or("retry_multiplier", defaults.multiplier)?,
            max_delay: Duration::from_millis(
                provider.get_u64_or("retry_max_delay_ms", defaults.max_delay.as_millis() as u64)?,
            ),
        };

        policy.validate()?;
        Ok(policy)
    }
}
