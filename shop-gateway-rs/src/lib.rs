//! Shopping assistant gateway
//!
//! HTTP surface for the storefront: a catalog proxy with search, random
//! recommendations and a chat endpoint that falls back to canned replies
//! when no generation provider answers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::Request,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use shop_sdk::{CatalogQuery, Product};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod recommend;
pub mod search;
pub mod validation;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{CatalogSource, ShopGateway};

use chat::ChatEntry;
use validation::{payload_limit_config, validate_chat_message};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductsParams {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendParams {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub status: String,
    pub catalog_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_catalog_provider: Option<String>,
    pub generation_provider: String,
}

impl ShopGateway {
    /// Create the Axum router with all routes and middleware
    pub fn create_router(self: Arc<Self>) -> Router {
        let _ = *START_TIME;

        let mut router = Router::new()
            .route("/", get(Self::root_handler))
            .route("/health", get(Self::health_handler))
            .nest("/api/products", Self::catalog_routes(CatalogSource::Primary))
            .route("/api/recommendations", get(Self::recommendations_handler))
            .route("/api/chat", post(Self::chat_handler))
            .route("/api/chat/history", get(Self::history_handler));

        if self.has_legacy_catalog() {
            router = router.nest("/api/v1/products", Self::catalog_routes(CatalogSource::Legacy));
        }

        router
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %Uuid::new_v4(),
                        )
                    }))
                    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                    .layer(payload_limit_config()),
            )
            .with_state(self)
    }

    fn catalog_routes(source: CatalogSource) -> Router<Arc<Self>> {
        Router::new()
            .route("/", get(Self::products_handler))
            .route("/category/:category", get(Self::category_handler))
            .route("/search", get(Self::search_handler))
            .layer(Extension(source))
    }

    async fn root_handler() -> impl IntoResponse {
        Json(serde_json::json!({
            "service": "Shop Gateway",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                "GET /health",
                "GET /api/products",
                "GET /api/products/category/{category}",
                "GET /api/products/search?q=",
                "GET /api/recommendations",
                "POST /api/chat",
                "GET /api/chat/history"
            ]
        }))
    }

    async fn health_handler(State(state): State<Arc<Self>>) -> impl IntoResponse {
        Json(HealthResponse {
            healthy: true,
            service_name: "shop-gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: START_TIME.elapsed().as_secs(),
            status: "SERVING".to_string(),
            catalog_provider: state.catalog_name().to_string(),
            legacy_catalog_provider: state.legacy_catalog_name().map(str::to_string),
            generation_provider: state.generator_name().unwrap_or("none").to_string(),
        })
    }

    async fn products_handler(
        State(state): State<Arc<Self>>,
        Extension(source): Extension<CatalogSource>,
        params: std::result::Result<Query<ProductsParams>, QueryRejection>,
    ) -> Result<Json<Vec<Product>>> {
        let Query(params) = params.map_err(query_error)?;
        let query = CatalogQuery::from_parts(params.category.as_deref(), params.q.as_deref());

        Ok(Json(state.products(source, query).await?))
    }

    async fn category_handler(
        State(state): State<Arc<Self>>,
        Extension(source): Extension<CatalogSource>,
        Path(category): Path<String>,
    ) -> Result<Json<Vec<Product>>> {
        let category = category.trim();
        if category.is_empty() {
            return Err(GatewayError::InvalidQuery("category must not be empty".to_string()));
        }

        Ok(Json(state.products(source, CatalogQuery::Category(category.to_string())).await?))
    }

    async fn search_handler(
        State(state): State<Arc<Self>>,
        Extension(source): Extension<CatalogSource>,
        params: std::result::Result<Query<SearchParams>, QueryRejection>,
    ) -> Result<Json<Vec<Product>>> {
        let Query(params) = params.map_err(query_error)?;
        let text = params.q.unwrap_or_default();

        Ok(Json(state.search(source, &text).await?))
    }

    async fn recommendations_handler(
        State(state): State<Arc<Self>>,
        params: std::result::Result<Query<RecommendParams>, QueryRejection>,
    ) -> Result<Json<Vec<Product>>> {
        let Query(params) = params.map_err(query_error)?;

        Ok(Json(state.recommendations(params.count).await?))
    }

    async fn chat_handler(
        State(state): State<Arc<Self>>,
        payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
    ) -> Result<Json<ChatResponse>> {
        let Json(request) = payload.map_err(|rejection| GatewayError::InvalidMessage(rejection.body_text()))?;
        let message = validate_chat_message(request.message.as_deref())?;

        let reply = state.chat(&message).await;
        tracing::info!(provenance = ?reply.provenance(), "chat answered");

        Ok(Json(ChatResponse {
            response: reply.into_text(),
        }))
    }

    async fn history_handler(State(state): State<Arc<Self>>) -> Json<Vec<ChatEntry>> {
        Json(state.history().await)
    }
}

fn query_error(rejection: QueryRejection) -> GatewayError {
    GatewayError::InvalidQuery(rejection.body_text())
}
