//! Catalog Demo
//!
//! Lists a few products from the configured catalog (DummyJSON by default)
//! through the retry executor, then runs a search.
//!
//! Run with `CATALOG_PROVIDER=fakestore` to see the FakeStore flavour reject
//! the text query.

use shop_sdk::{
    catalog::catalog_client,
    config::{CatalogConfig, DEFAULT_PROVIDER},
    CatalogQuery, Result, RetryExecutor, RetryPolicy,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = CatalogConfig::from_provider(&**DEFAULT_PROVIDER)?;
    let retry = RetryExecutor::new(RetryPolicy::from_provider(&**DEFAULT_PROVIDER)?);
    let catalog = catalog_client(config)?;

    println!("Catalog Demo ({})", catalog.name());
    println!("============\n");

    let products = retry.execute(|| catalog.list_products(&CatalogQuery::All)).await?;
    for product in products.iter().take(5) {
        println!("#{:<4} {:<50} {:>8.2}  [{}]", product.id, product.title, product.price, product.category);
    }
    println!("... {} products in total\n", products.len());

    let query = CatalogQuery::Text("phone".to_string());
    match retry.execute(|| catalog.list_products(&query)).await {
        Ok(found) => println!("search 'phone': {} result(s)", found.len()),
        Err(e) => println!("search 'phone' failed: {} ({})", e, e.kind()),
    }

    Ok(())
}
