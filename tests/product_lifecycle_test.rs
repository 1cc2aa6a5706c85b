mod common;

use axum::{body, http::Method, response::Response};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use stocktrack_api::entities::Product;

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn create_product_with_allocations() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/products",
            Some(json!({
                "name": "Keyboard",
                "price": 15.5,
                "warehouses": [{ "warehouseId": warehouse.id, "stock": 50 }]
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["name"], "Keyboard");
    assert_eq!(body["price"], json!(15.5));
    assert_eq!(body["isDeleted"], false);
    assert_eq!(body["productStock"][0]["warehouseId"], warehouse.id);
    assert_eq!(body["productStock"][0]["stock"], 50);

    assert_eq!(app.warehouse_row(warehouse.id).await.total_stock, 50);
    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn create_product_validation_messages() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;

    let cases = [
        (json!({ "price": 9.99 }), "Name, price and stock are required"),
        (json!({ "name": "Keyboard" }), "Name, price and stock are required"),
        (
            json!({ "name": "Keyboard", "price": -1 }),
            "Price must be a positive number",
        ),
        (
            json!({
                "name": "Keyboard",
                "price": 9.99,
                "warehouses": [{ "stock": 5 }]
            }),
            "warehouseId is required",
        ),
        (
            json!({
                "name": "Keyboard",
                "price": 9.99,
                "warehouses": [{ "warehouseId": warehouse.id, "stock": -5 }]
            }),
            "Stock need to be a positive number",
        ),
    ];

    for (payload, expected) in cases {
        let response = app
            .request_authenticated(Method::POST, "/products", Some(payload.clone()))
            .await;
        assert_eq!(response.status(), 400, "payload: {}", payload);
        let body = response_json(response).await;
        assert_eq!(body["error"], expected, "payload: {}", payload);
    }

    let products = Product::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list products");
    assert!(products.is_empty());
}

#[tokio::test]
async fn create_with_bad_warehouse_persists_nothing() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/products",
            Some(json!({
                "name": "Keyboard",
                "price": 15.5,
                "warehouses": [
                    { "warehouseId": warehouse.id, "stock": 10 },
                    { "warehouseId": 9999, "stock": 5 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Warehouse with ID 9999 not found");

    // The whole creation rolled back: no product row, no partial stock.
    let products = Product::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list products");
    assert!(products.is_empty());
    assert_eq!(app.warehouse_row(warehouse.id).await.total_stock, 0);
}

#[tokio::test]
async fn create_rejects_deleted_warehouses() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let delete = app
        .request_authenticated(Method::DELETE, &format!("/warehouse/{}", warehouse.id), None)
        .await;
    assert_eq!(delete.status(), 200);

    let response = app
        .request_authenticated(
            Method::POST,
            "/products",
            Some(json!({
                "name": "Keyboard",
                "price": 15.5,
                "warehouses": [{ "warehouseId": warehouse.id, "stock": 10 }]
            })),
        )
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(
        body["error"],
        format!("Warehouse with ID {} is no longer available", warehouse.id)
    );
}

#[tokio::test]
async fn update_replaces_the_whole_stock_distribution() {
    let app = TestApp::new().await;
    let first = app.seed_warehouse("First").await;
    let second = app.seed_warehouse("Second").await;
    let third = app.seed_warehouse("Third").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(first.id, 10), (second.id, 5)])
        .await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{}", product.id),
            Some(json!({
                "name": "Mechanical Keyboard",
                "price": 20,
                "warehouses": [
                    { "warehouseId": second.id, "stock": 8 },
                    { "warehouseId": third.id, "stock": 3 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["name"], "Mechanical Keyboard");
    assert_eq!(body["price"], json!(20.0));
    assert_eq!(body["productStock"].as_array().unwrap().len(), 2);

    // First lost its allocation, second moved 5 -> 8, third gained 3.
    assert!(app.relation_row(product.id, first.id).await.is_none());
    assert_eq!(app.relation_row(product.id, second.id).await.unwrap().stock, 8);
    assert_eq!(app.relation_row(product.id, third.id).await.unwrap().stock, 3);
    assert_eq!(app.warehouse_row(first.id).await.total_stock, 0);
    assert_eq!(app.warehouse_row(second.id).await.total_stock, 8);
    assert_eq!(app.warehouse_row(third.id).await.total_stock, 3);

    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn update_requires_the_warehouses_array() {
    let app = TestApp::new().await;
    let (product, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{}", product.id),
            Some(json!({ "name": "Keyboard", "price": 20 })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Name, price, and warehouses array are required");
}

#[tokio::test]
async fn update_failure_rolls_back_every_change() {
    let app = TestApp::new().await;
    let first = app.seed_warehouse("First").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(first.id, 10)])
        .await;

    // The unknown warehouse is checked after the removal pass would have
    // dropped the old allocation; the rollback must restore it.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{}", product.id),
            Some(json!({
                "name": "Keyboard",
                "price": 20,
                "warehouses": [{ "warehouseId": 9999, "stock": 3 }]
            })),
        )
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Warehouse with ID 9999 not found");

    assert_eq!(app.relation_row(product.id, first.id).await.unwrap().stock, 10);
    assert_eq!(app.warehouse_row(first.id).await.total_stock, 10);
    let row = Product::find_by_id(product.id)
        .one(app.state.db.as_ref())
        .await
        .expect("query product")
        .expect("product row");
    assert_eq!(row.price, dec!(15.5));

    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn delete_releases_stock_and_is_terminal() {
    let app = TestApp::new().await;
    let first = app.seed_warehouse("First").await;
    let second = app.seed_warehouse("Second").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(first.id, 10), (second.id, 5)])
        .await;

    let response = app
        .request_authenticated(Method::DELETE, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Product deleted successfully");
    assert_eq!(body["product"]["isDeleted"], true);

    assert!(app.relation_row(product.id, first.id).await.is_none());
    assert!(app.relation_row(product.id, second.id).await.is_none());
    assert_eq!(app.warehouse_row(first.id).await.total_stock, 0);
    assert_eq!(app.warehouse_row(second.id).await.total_stock, 0);

    // Deletion is terminal: a second attempt conflicts.
    let response = app
        .request_authenticated(Method::DELETE, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(response.status(), 409);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Product has already been deleted");

    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn listing_endpoints_split_on_deletion() {
    let app = TestApp::new().await;
    let (keyboard, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;
    let (_mouse, _) = app.seed_product("Mouse", dec!(8), &[]).await;

    let delete = app
        .request_authenticated(Method::DELETE, &format!("/products/{}", keyboard.id), None)
        .await;
    assert_eq!(delete.status(), 200);

    let all = response_json(app.request_authenticated(Method::GET, "/products/all", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let active =
        response_json(app.request_authenticated(Method::GET, "/products/all/active", None).await)
            .await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["name"], "Mouse");

    let deleted =
        response_json(app.request_authenticated(Method::GET, "/products/all/deleted", None).await)
            .await;
    assert_eq!(deleted.as_array().unwrap().len(), 1);
    assert_eq!(deleted[0]["name"], "Keyboard");
}

#[tokio::test]
async fn get_product_includes_stock_with_warehouses() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(warehouse.id, 50)])
        .await;

    let response = app
        .request_authenticated(Method::GET, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["id"], product.id);
    assert_eq!(body["productStock"][0]["stock"], 50);
    assert_eq!(body["productStock"][0]["warehouse"]["name"], "Central Hub");

    let missing = app
        .request_authenticated(Method::GET, "/products/9999", None)
        .await;
    assert_eq!(missing.status(), 404);
    let body = response_json(missing).await;
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn repeated_reads_return_identical_bodies() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(warehouse.id, 50)])
        .await;

    for path in [
        format!("/products/{}", product.id),
        format!("/warehouse/{}", warehouse.id),
    ] {
        let first =
            response_json(app.request_authenticated(Method::GET, &path, None).await).await;
        let second =
            response_json(app.request_authenticated(Method::GET, &path, None).await).await;
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn deleted_products_stay_updatable() {
    let app = TestApp::new().await;
    let (product, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;

    let delete = app
        .request_authenticated(Method::DELETE, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(delete.status(), 200);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/products/{}", product.id),
            Some(json!({ "name": "Archived Keyboard", "price": 1, "warehouses": [] })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["name"], "Archived Keyboard");
    assert_eq!(body["isDeleted"], true);
}
