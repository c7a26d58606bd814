//! End-to-end tests for the gateway router against mocked upstreams

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shop_gateway::chat::rules;
use shop_gateway::{GatewayConfig, ShopGateway};
use shop_sdk::config::{CatalogConfig, CatalogFlavor};
use shop_sdk::{RetryPolicy, ServiceError, TextGenerator};

mock! {
    pub Generator {}

    #[async_trait]
    impl TextGenerator for Generator {
        fn name(&self) -> &'static str;
        async fn generate(&self, prompt: &str) -> shop_sdk::Result<String>;
    }
}

fn catalog_config(flavor: CatalogFlavor, base_url: &str) -> CatalogConfig {
    CatalogConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 2,
        ..CatalogConfig::for_flavor(flavor)
    }
}

fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        catalog: catalog_config(CatalogFlavor::DummyJson, base_url),
        recommendation_seed: Some(5),
        retry: RetryPolicy {
            base_delay: Duration::from_millis(5),
            ..RetryPolicy::default()
        },
        ..GatewayConfig::default()
    }
}

fn router(config: GatewayConfig, generator: Option<Arc<dyn TextGenerator>>) -> Router {
    let gateway = ShopGateway::from_config(&config, generator).expect("gateway should build");
    Arc::new(gateway).create_router()
}

fn dummyjson_products() -> Value {
    json!({
        "products": [
            { "id": 1, "title": "Essence Mascara Lash Princess", "price": 9.99,
              "thumbnail": "https://cdn.dummyjson.com/1.jpg", "category": "beauty" },
            { "id": 2, "title": "Eyeshadow Palette with Mirror", "price": 19.99,
              "thumbnail": "https://cdn.dummyjson.com/2.jpg", "category": "beauty" },
            { "id": 3, "title": "Powder Canister", "price": 14.99,
              "thumbnail": "https://cdn.dummyjson.com/3.jpg", "category": "beauty" },
            { "id": 4, "title": "Red Lipstick", "price": 12.99,
              "thumbnail": "https://cdn.dummyjson.com/4.jpg", "category": "beauty" },
            { "id": 5, "title": "Red Nail Polish", "price": 8.99,
              "thumbnail": "https://cdn.dummyjson.com/5.jpg", "category": "beauty" },
            { "id": 6, "title": "Calvin Klein CK One", "price": 49.99,
              "thumbnail": "https://cdn.dummyjson.com/6.jpg", "category": "fragrances" }
        ],
        "total": 6,
        "skip": 0,
        "limit": 20
    })
}

async fn dummyjson_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dummyjson_products()))
        .mount(&server)
        .await;
    server
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_chat(app: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn ids(body: &Value) -> Vec<u64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_reports_providers() {
    let app = router(gateway_config("http://127.0.0.1:9"), None);

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SERVING");
    assert_eq!(body["catalog_provider"], "dummyjson");
    assert_eq!(body["generation_provider"], "none");
}

#[tokio::test]
async fn test_products_are_normalized() {
    let server = dummyjson_server().await;
    let app = router(gateway_config(&server.uri()), None);

    let (status, body) = get(&app, "/api/products").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(body[0]["title"], "Essence Mascara Lash Princess");
    assert_eq!(body[0]["description"], "");
}

#[tokio::test]
async fn test_category_route_and_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/category/fragrances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "id": 6, "title": "Calvin Klein CK One", "price": 49.99,
                  "thumbnail": "https://cdn.dummyjson.com/6.jpg", "category": "fragrances" }
            ],
            "total": 1, "skip": 0, "limit": 1
        })))
        .expect(2)
        .mount(&server)
        .await;

    let app = router(gateway_config(&server.uri()), None);

    let (status, body) = get(&app, "/api/products/category/fragrances").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![6]);

    // Category wins over q
    let (status, body) = get(&app, "/api/products?category=fragrances&q=lipstick").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![6]);
}

#[tokio::test]
async fn test_search_delegates_to_native_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/search"))
        .and(query_param("q", "red"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "id": 5, "title": "Red Nail Polish", "price": 8.99,
                  "thumbnail": "https://cdn.dummyjson.com/5.jpg", "category": "beauty" },
                { "id": 4, "title": "Red Lipstick", "price": 12.99,
                  "thumbnail": "https://cdn.dummyjson.com/4.jpg", "category": "beauty" }
            ],
            "total": 2, "skip": 0, "limit": 2
        })))
        .expect(2)
        .mount(&server)
        .await;

    let app = router(gateway_config(&server.uri()), None);

    // Provider ranking is kept
    let (status, body) = get(&app, "/api/products/search?q=red").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![5, 4]);

    let (_, body) = get(&app, "/api/products?q=%20red%20").await;
    assert_eq!(ids(&body), vec![5, 4]);
}

#[tokio::test]
async fn test_blank_search_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dummyjson_products()))
        .expect(0)
        .mount(&server)
        .await;

    let app = router(gateway_config(&server.uri()), None);

    for uri in ["/api/products/search?q=", "/api/products/search?q=%20%20", "/api/products/search"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(body["kind"], "invalid_query");
    }
}

#[tokio::test]
async fn test_search_scans_catalog_without_native_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Mens Cotton Jacket", "price": 55.99, "description": "Great outerwear",
              "category": "men's clothing", "image": "https://fakestoreapi.com/img/1.jpg" },
            { "id": 2, "title": "SanDisk SSD PLUS 1TB", "price": 109.0, "description": "Easy upgrade",
              "category": "electronics", "image": "https://fakestoreapi.com/img/2.jpg" },
            { "id": 3, "title": "Womens Rain Jacket", "price": 39.99, "description": "Lightweight",
              "category": "women's clothing", "image": "https://fakestoreapi.com/img/3.jpg" }
        ])))
        .mount(&server)
        .await;

    let config = GatewayConfig {
        catalog: catalog_config(CatalogFlavor::FakeStore, &server.uri()),
        ..gateway_config(&server.uri())
    };
    let app = router(config, None);

    let (status, body) = get(&app, "/api/products/search?q=JACKET").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 3]);
    assert_eq!(body[0]["thumbnail"], "https://fakestoreapi.com/img/1.jpg");
}

#[tokio::test]
async fn test_recommendations() {
    let server = dummyjson_server().await;
    let app = router(gateway_config(&server.uri()), None);

    let (status, body) = get(&app, "/api/recommendations").await;
    assert_eq!(status, StatusCode::OK);
    let picked = ids(&body);
    assert_eq!(picked.len(), 4);
    let mut unique = picked.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 4);
    assert!(picked.iter().all(|id| (1..=6).contains(id)));

    let (_, body) = get(&app, "/api/recommendations?count=2").await;
    assert_eq!(ids(&body).len(), 2);

    let (status, body) = get(&app, "/api/recommendations?count=500").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "invalid_query");

    let (status, body) = get(&app, "/api/recommendations?count=many").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "invalid_query");
}

#[tokio::test]
async fn test_recommendations_from_empty_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [], "total": 0, "skip": 0, "limit": 20
        })))
        .mount(&server)
        .await;

    let app = router(gateway_config(&server.uri()), None);
    let (status, body) = get(&app, "/api/recommendations").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "empty_pool");
}

#[tokio::test]
async fn test_unreachable_catalog_maps_to_503() {
    let app = router(gateway_config("http://127.0.0.1:9"), None);

    let (status, body) = get(&app, "/api/products").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "retry_exhausted");
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("after 3 attempt(s)"));
    assert!(!error.contains("127.0.0.1"));
}

#[tokio::test]
async fn test_upstream_errors_map_to_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/category/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Category not found" })))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let app = router(gateway_config(&server.uri()), None);

    // Every failure is retried; the status still follows the last cause
    let (status, body) = get(&app, "/api/products/category/nope").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "retry_exhausted");
    assert!(body["error"].as_str().unwrap().contains("status 404"));

    let (status, body) = get(&app, "/api/products").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "retry_exhausted");
}

#[tokio::test]
async fn test_slow_catalog_hits_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(dummyjson_products())
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let config = GatewayConfig {
        request_deadline: Duration::from_millis(200),
        ..gateway_config(&server.uri())
    };
    let app = router(config, None);

    let (status, body) = get(&app, "/api/products").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["kind"], "deadline_exceeded");
}

#[tokio::test]
async fn test_chat_without_credential_uses_rules() {
    let app = router(gateway_config("http://127.0.0.1:9"), None);

    let (status, body) = post_chat(&app, json!({ "message": "What's your return policy?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], rules::RETURNS_REPLY);

    let (_, body) = post_chat(&app, json!({ "message": "hello there" })).await;
    assert_eq!(body["response"], rules::GREETING_REPLY);
}

#[tokio::test]
async fn test_invalid_chat_requests() {
    let app = router(gateway_config("http://127.0.0.1:9"), None);

    for payload in [json!({ "message": "" }), json!({ "message": "   " }), json!({}), json!({ "message": 5 })] {
        let (status, body) = post_chat(&app, payload.clone()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", payload);
        assert_eq!(body["kind"], "invalid_message");
    }

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "invalid_message");

    // Oversized bodies get the same JSON error shape
    let (status, body) = post_chat(&app, json!({ "message": "a".repeat(128 * 1024) })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "invalid_message");

    // Rejected messages are not recorded
    let (_, history) = get(&app, "/api/chat/history").await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generation_failure_falls_back() {
    let mut generator = MockGenerator::new();
    generator.expect_name().return_const("gemini");
    generator
        .expect_generate()
        .times(3)
        .returning(|_| Err(ServiceError::upstream(503, "model overloaded")));

    let app = router(gateway_config("http://127.0.0.1:9"), Some(Arc::new(generator)));

    let (status, body) = post_chat(&app, json!({ "message": "When will my delivery arrive?" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], rules::SHIPPING_REPLY);

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["generation_provider"], "gemini");
}

#[tokio::test]
async fn test_generated_reply_is_returned() {
    let mut generator = MockGenerator::new();
    generator.expect_name().return_const("openai");
    generator
        .expect_generate()
        .withf(|prompt| prompt == "Recommend a gift")
        .returning(|_| Ok("How about a bracelet?".to_string()));

    let app = router(gateway_config("http://127.0.0.1:9"), Some(Arc::new(generator)));

    let (_, body) = post_chat(&app, json!({ "message": "  Recommend a gift  " })).await;
    assert_eq!(body["response"], "How about a bracelet?");

    let (_, history) = get(&app, "/api/chat/history").await;
    assert_eq!(history[1]["provenance"], "generated");
    assert_eq!(history[0]["text"], "Recommend a gift");
}

#[tokio::test]
async fn test_history_pairs_messages_with_replies() {
    let app = router(gateway_config("http://127.0.0.1:9"), None);
    let messages = ["hi", "Do you sell electronics?", "Show me some jewelry"];

    for message in messages {
        post_chat(&app, json!({ "message": message })).await;
    }

    let (status, history) = get(&app, "/api/chat/history").await;
    assert_eq!(status, StatusCode::OK);

    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2 * messages.len());
    for (i, message) in messages.iter().enumerate() {
        assert_eq!(entries[2 * i]["role"], "user");
        assert_eq!(entries[2 * i]["text"], *message);
        assert_eq!(entries[2 * i + 1]["role"], "assistant");
        assert_eq!(entries[2 * i + 1]["provenance"], "fallback");
    }
    assert_eq!(entries[3]["text"], rules::ELECTRONICS_REPLY);
    assert_eq!(entries[5]["text"], rules::JEWELRY_REPLY);
}

#[tokio::test]
async fn test_concurrent_chats_keep_exchanges_together() {
    let app = router(gateway_config("http://127.0.0.1:9"), None);
    let total = 40;

    let handles: Vec<_> = (0..total)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { post_chat(&app, json!({ "message": format!("message {}", i) })).await })
        })
        .collect();
    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = get(&app, "/api/chat/history").await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 2 * total);

    for pair in entries.chunks(2) {
        assert_eq!(pair[0]["role"], "user");
        assert_eq!(pair[1]["role"], "assistant");
        assert_eq!(pair[1]["text"], rules::DEFAULT_REPLY);
        assert_eq!(pair[1]["sequence"].as_u64().unwrap(), pair[0]["sequence"].as_u64().unwrap() + 1);
    }
}

#[tokio::test]
async fn test_legacy_routes_only_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "title": "White Gold Plated Princess", "price": 9.99,
              "description": "Classic wedding engagement ring", "category": "jewelery",
              "image": "https://fakestoreapi.com/img/9.jpg" },
            { "id": 10, "title": "Pierced Owl Rose Gold Plated", "price": 10.99,
              "description": "Double flared tunnel plug earrings", "category": "jewelery",
              "image": "https://fakestoreapi.com/img/10.jpg" }
        ])))
        .mount(&server)
        .await;

    let without = router(gateway_config("http://127.0.0.1:9"), None);
    let (status, _) = get(&without, "/api/v1/products").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let config = GatewayConfig {
        legacy_catalog: Some(catalog_config(CatalogFlavor::FakeStore, &server.uri())),
        ..gateway_config("http://127.0.0.1:9")
    };
    let app = router(config, None);

    let (status, body) = get(&app, "/api/v1/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![9, 10]);

    // The secondary catalog searches descriptions too
    let (status, body) = get(&app, "/api/v1/products/search?q=earrings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![10]);

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["legacy_catalog_provider"], "fakestore");
}
