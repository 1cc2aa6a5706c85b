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

/// Body of a recorded sale.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaleResponse {
    #[schema(example = "Sales done successfully")]
    pub message: String,
    pub sales: MovementResponse,
}

#[utoipa::path(
    put,
    path = "/sales/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = MovementInput,
    responses(
        (status = 200, description = "Sale recorded", body = SaleResponse),
        (status = 400, description = "Invalid payload or deleted product", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or stock relation not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Stock movements"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<MovementInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = state.stock.sale(id, input).await?;
    Ok(Json(SaleResponse {
        message: "Sales done successfully".to_string(),
        sales: receipt.into(),
    }))
}

/// Sales routes, open to every authenticated role.
pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", put(record_sale))
        .route_layer(middleware::from_fn_with_state(
            super::ALL_ROLES,
            require_roles,
        ))
}
