mod common;

use axum::{body, http::Method, response::Response};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use stocktrack_api::entities::{stock_movement::MovementType, StockMovement};

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn purchase_creates_relation_and_updates_totals() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/purchase/{}", product.id),
            Some(json!({ "value": 50, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Purchase done successfully");
    assert_eq!(body["purchase"]["type"], "Purchase");
    assert_eq!(body["purchase"]["amount"], 50);
    assert_eq!(body["purchase"]["warehouse"]["totalStock"], 50);
    assert_eq!(body["purchase"]["product"]["name"], "Keyboard");

    let relation = app
        .relation_row(product.id, warehouse.id)
        .await
        .expect("relation created by first purchase");
    assert_eq!(relation.stock, 50);

    // A second purchase increments instead of recreating the relation.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/purchase/{}", product.id),
            Some(json!({ "value": 5, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let relation = app.relation_row(product.id, warehouse.id).await.unwrap();
    assert_eq!(relation.stock, 55);
    assert_eq!(app.warehouse_row(warehouse.id).await.total_stock, 55);

    let movements = StockMovement::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list movements");
    assert_eq!(movements.len(), 2);
    assert!(movements
        .iter()
        .all(|m| m.movement_type == MovementType::Purchase));

    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn sale_decrements_stock_and_appends_to_ledger() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(warehouse.id, 50)])
        .await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/sales/{}", product.id),
            Some(json!({ "value": 5, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Sales done successfully");
    assert_eq!(body["sales"]["type"], "Sales");
    assert_eq!(body["sales"]["amount"], 5);
    assert_eq!(body["sales"]["warehouse"]["totalStock"], 45);

    let relation = app.relation_row(product.id, warehouse.id).await.unwrap();
    assert_eq!(relation.stock, 45);
    assert_eq!(app.warehouse_row(warehouse.id).await.total_stock, 45);

    // Allocations seeded at product creation never touch the ledger, so the
    // sale is the only movement on record.
    let movements = StockMovement::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Sales);
    assert_eq!(movements[0].amount, 5);

    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn oversold_sale_is_rejected_without_state_change() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(warehouse.id, 3)])
        .await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/sales/{}", product.id),
            Some(json!({ "value": 10, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 409);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Stock not enough to do sales");

    let relation = app.relation_row(product.id, warehouse.id).await.unwrap();
    assert_eq!(relation.stock, 3);
    assert_eq!(app.warehouse_row(warehouse.id).await.total_stock, 3);

    let movements = StockMovement::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list movements");
    assert!(movements.is_empty());

    app.assert_totals_consistent().await;
}

#[tokio::test]
async fn sale_requires_an_existing_stock_relation() {
    let app = TestApp::new().await;
    let stocked = app.seed_warehouse("Stocked").await;
    let other = app.seed_warehouse("Empty").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(stocked.id, 10)])
        .await;

    // Existing warehouse, but no relation to this product.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/sales/{}", product.id),
            Some(json!({ "value": 1, "warehouseId": other.id })),
        )
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Warehouse relation not found");

    // Missing warehouseId entirely.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/sales/{}", product.id),
            Some(json!({ "value": 1 })),
        )
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Warehouse relation not found for this product");
}

#[tokio::test]
async fn purchase_validation_messages() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;
    let uri = format!("/purchase/{}", product.id);

    let cases = [
        (json!({ "warehouseId": warehouse.id }), "Value is required"),
        (
            json!({ "value": 0, "warehouseId": warehouse.id }),
            "Value is required",
        ),
        (
            json!({ "value": -3, "warehouseId": warehouse.id }),
            "Value must be a positive number",
        ),
        (json!({ "value": 5 }), "warehouseId is required"),
    ];

    for (payload, expected) in cases {
        let response = app
            .request_authenticated(Method::PUT, &uri, Some(payload.clone()))
            .await;
        assert_eq!(response.status(), 400, "payload: {}", payload);
        let body = response_json(response).await;
        assert_eq!(body["error"], expected, "payload: {}", payload);
    }

    // Nothing above may have written a movement.
    let movements = StockMovement::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list movements");
    assert!(movements.is_empty());
}

#[tokio::test]
async fn purchase_rejects_unknown_and_deleted_products() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;

    let response = app
        .request_authenticated(
            Method::PUT,
            "/purchase/9999",
            Some(json!({ "value": 5, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Product not found");

    let (product, _) = app.seed_product("Keyboard", dec!(15.5), &[]).await;
    let delete = app
        .request_authenticated(Method::DELETE, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(delete.status(), 200);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/purchase/{}", product.id),
            Some(json!({ "value": 5, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Product has been deleted");
}

#[tokio::test]
async fn zero_value_sale_is_recorded_as_a_noop_movement() {
    let app = TestApp::new().await;
    let warehouse = app.seed_warehouse("Central Hub").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(warehouse.id, 10)])
        .await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/sales/{}", product.id),
            Some(json!({ "value": 0, "warehouseId": warehouse.id })),
        )
        .await;
    assert_eq!(response.status(), 200);

    let relation = app.relation_row(product.id, warehouse.id).await.unwrap();
    assert_eq!(relation.stock, 10);

    let movements = StockMovement::find()
        .all(app.state.db.as_ref())
        .await
        .expect("list movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, 0);
}

#[tokio::test]
async fn movements_stay_scoped_to_their_warehouse() {
    let app = TestApp::new().await;
    let first = app.seed_warehouse("First").await;
    let second = app.seed_warehouse("Second").await;
    let (product, _) = app
        .seed_product("Keyboard", dec!(15.5), &[(first.id, 10), (second.id, 5)])
        .await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/purchase/{}", product.id),
            Some(json!({ "value": 7, "warehouseId": second.id })),
        )
        .await;
    assert_eq!(response.status(), 200);

    assert_eq!(app.relation_row(product.id, first.id).await.unwrap().stock, 10);
    assert_eq!(
        app.relation_row(product.id, second.id).await.unwrap().stock,
        12
    );
    assert_eq!(app.warehouse_row(first.id).await.total_stock, 10);
    assert_eq!(app.warehouse_row(second.id).await.total_stock, 12);

    app.assert_totals_consistent().await;
}
