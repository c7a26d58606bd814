// shop-gateway-rs/src/main.rs
// Shopping assistant gateway - HTTP entry point for the storefront
//
// Serves:
// - Product listings, category filters and search from the configured catalog
// - Random product recommendations
// - Chat with a generation provider and rule-based fallback

use std::sync::Arc;

use anyhow::Context;
use shop_gateway::{GatewayConfig, ShopGateway};
use shop_sdk::config::DEFAULT_PROVIDER;
use shop_sdk::generation::generator_from_provider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_provider(&**DEFAULT_PROVIDER).context("invalid gateway configuration")?;
    let generator = generator_from_provider(&**DEFAULT_PROVIDER).context("invalid generation configuration")?;
    if generator.is_none() {
        tracing::warn!("No generation credential configured, chat will use rule-based replies only");
    }

    let gateway = Arc::new(ShopGateway::from_config(&config, generator)?);
    let app = gateway.create_router();

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, catalog = %config.catalog.flavor.name(), "Shop gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shop gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
