//! Recommendation sampling
//!
//! Recommendations are a uniform random sample of the catalog without
//! repetition. There is no weighting by history or popularity.

use rand::seq::index;
use rand::Rng;
use shop_sdk::Product;

use crate::error::{GatewayError, Result};

/// Draw `min(count, pool.len())` distinct products uniformly at random
///
/// The result is in random order. An empty pool is an error unless nothing
/// was asked for.
pub fn recommend<R: Rng + ?Sized>(pool: &[Product], count: usize, rng: &mut R) -> Result<Vec<Product>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    if pool.is_empty() {
        return Err(GatewayError::EmptyPool);
    }

    let amount = count.min(pool.len());
    Ok(index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect())
}
