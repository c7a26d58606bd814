//! # Shop SDK
//!
//! Upstream integrations for the shopping assistant gateway.
//!
//! This crate provides:
//!
//! - Typed clients for the product catalog APIs (DummyJSON, FakeStore)
//! - Typed clients for text generation (Gemini, OpenAI-compatible)
//! - A shared error taxonomy for upstream failures
//! - Bounded retry with exponential backoff and deadlines
//! - Configuration management utilities
//!
//! ## Architecture
//!
//! - `CatalogProvider`: read-only product listings
//! - `TextGenerator`: prompt in, text out
//! - `RetryExecutor`: the one retry loop every outbound call goes through
//! - `ServiceError`: upstream error handling

// Re-export service-specific modules
pub mod services;
pub use services::{catalog, generation};
pub use services::{CatalogProvider, CatalogQuery, Product, TextGenerator};

// Re-export error handling
pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

// Re-export resilience patterns
pub mod resilience;
pub use resilience::{RetryExecutor, RetryPolicy};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, ConfigProviderExt, ServiceConfig};

// Utility module for common functionality
pub mod util;

#[cfg(test)]
mod tests;
