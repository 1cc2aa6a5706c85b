use axum::{
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::common::MovementResponse;
use crate::auth::require_roles;
use crate::errors::ServiceError;
use crate::services::stock::MovementInput;
use crate::AppState;

/// Body of a recorded purchase.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    #[schema(example = "Purchase done successfully")]
    pub message: String,
    pub purchase: MovementResponse,
}

#[utoipa::path(
    put,
    path = "/purchase/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = MovementInput,
    responses(
        (status = 200, description = "Purchase recorded", body = PurchaseResponse),
        (status = 400, description = "Invalid payload or deleted product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Stock movements"
)]
pub async fn record_purchase(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<MovementInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = state.stock.purchase(id, input).await?;
    Ok(Json(PurchaseResponse {
        message: "Purchase done successfully".to_string(),
        purchase: receipt.into(),
    }))
}

/// Purchase routes, open to every authenticated role.
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", put(record_purchase))
        .route_layer(middleware::from_fn_with_state(
            super::ALL_ROLES,
            require_roles,
        ))
}
