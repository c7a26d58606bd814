//! Service-specific client implementations
//!
//! This module contains client implementations for the upstream catalog and
//! text-generation APIs.

pub mod catalog;
pub mod common;
pub mod generation;

pub use catalog::{catalog_client, CatalogProvider, CatalogQuery, Product};
pub use common::UserAgent;
pub use generation::{generator_from_provider, TextGenerator};
