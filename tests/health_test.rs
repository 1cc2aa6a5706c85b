mod common;

use axum::{body, http::Method, response::Response};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn health_endpoints_answer_without_auth() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert!(body["version"].as_str().is_some());

    let response = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn metrics_expose_movement_counters() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/purchase/{}", product.id),
            Some(json!({ "value": 5, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), 200);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("metrics body");
    let text = String::from_utf8(bytes.to_vec()).expect("metrics text");
    assert!(text.contains("stock_purchases_total"));
}
