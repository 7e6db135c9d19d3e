use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use dex_order_engine::api::{self, DEMO_VENUES};
use dex_order_engine::config::EngineConfig;

fn peer() -> SocketAddr {
    "127.0.0.1:9999".parse().unwrap()
}

fn app() -> axum::Router {
    api::router(api::build_state(EngineConfig::default()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_submit_order_accepts_a_well_formed_request_and_returns_its_id() {
    let payload = json!({
        "tokenIn": "SOL",
        "tokenOut": "USDC",
        "amountIn": 100.0,
        "routingStrategy": "BEST_PRICE",
    });

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer()))
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["routingStrategy"], "BEST_PRICE");
    assert!(body["orderId"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_order_degrades_an_unknown_routing_strategy_with_a_warning_instead_of_rejecting() {
    let payload = json!({
        "tokenIn": "SOL",
        "tokenOut": "USDC",
        "amountIn": 100.0,
        "routingStrategy": "MOST_VIBES",
    });

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer()))
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["routingStrategy"], "BEST_PRICE");
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_submit_order_rejects_an_invalid_request_with_422_and_a_validation_body() {
    let payload = json!({
        "tokenIn": "SOL",
        "tokenOut": "SOL",
        "amountIn": -5.0,
    });

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer()))
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["valid"], false);
    assert!(body["errors"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_get_order_returns_404_for_an_unknown_id() {
    let response = app()
        .oneshot(Request::builder().uri("/orders/does-not-exist").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_order_returns_the_order_just_submitted() {
    let state = api::build_state(EngineConfig::default());
    let app = api::router(state.clone());

    let payload = json!({ "tokenIn": "SOL", "tokenOut": "USDC", "amountIn": 50.0 });
    let submit = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer()))
        .body(Body::from(payload.to_string()))
        .unwrap();
    let submitted = app.clone().oneshot(submit).await.unwrap();
    let order_id = body_json(submitted).await["orderId"].as_str().unwrap().to_string();

    let fetch = Request::builder().uri(format!("/orders/{order_id}")).body(Body::empty()).unwrap();
    let response = app.oneshot(fetch).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], order_id);
}

#[tokio::test]
async fn test_list_orders_is_empty_on_a_fresh_state() {
    let response = app()
        .oneshot(Request::builder().uri("/orders").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_orders_honors_the_limit_query_parameter() {
    let state = api::build_state(EngineConfig::default());
    let app = api::router(state.clone());

    for _ in 0..3 {
        let payload = json!({ "tokenIn": "SOL", "tokenOut": "USDC", "amountIn": 10.0 });
        let submit = Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json")
            .extension(ConnectInfo(peer()))
            .body(Body::from(payload.to_string()))
            .unwrap();
        app.clone().oneshot(submit).await.unwrap();
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/orders?limit=2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_stats_reports_a_venue_entry_per_demo_venue_after_an_order_completes() {
    let state = api::build_state(EngineConfig::default());
    let app = api::router(state.clone());

    let payload = json!({ "tokenIn": "SOL", "tokenOut": "USDC", "amountIn": 10.0 });
    let submit = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer()))
        .body(Body::from(payload.to_string()))
        .unwrap();
    let submitted = app.clone().oneshot(submit).await.unwrap();
    let order_id = body_json(submitted).await["orderId"].as_str().unwrap().to_string();

    // Give the background order-driving task time to collect quotes from
    // every in-memory venue before inspecting the aggregate stats.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let _ = state.repository.get_order_by_id(&order_id).await;

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let per_venue = body["per_venue"].as_object().unwrap();
    for venue in DEMO_VENUES {
        assert!(per_venue.contains_key(venue), "expected a stats entry for venue '{venue}'");
    }
}
