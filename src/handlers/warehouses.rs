use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::common::{WarehouseDetailResponse, WarehouseResponse};
use crate::auth::require_roles;
use crate::errors::ServiceError;
use crate::services::warehouses::WarehouseInput;
use crate::AppState;

/// Body of a successful warehouse deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct WarehouseDeletedResponse {
    #[schema(example = "Warehouse deleted successfully")]
    pub message: String,
    pub warehouse: WarehouseResponse,
}

#[utoipa::path(
    get,
    path = "/warehouse/all",
    responses(
        (status = 200, description = "All warehouses, deleted ones included", body = Vec<WarehouseResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state.warehouses.list().await?;
    let body: Vec<WarehouseResponse> = warehouses.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/warehouse/all/active",
    responses(
        (status = 200, description = "Warehouses that are not soft-deleted", body = Vec<WarehouseResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn list_active_warehouses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state.warehouses.list_active().await?;
    let body: Vec<WarehouseResponse> = warehouses.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/warehouse/all/deleted",
    responses(
        (status = 200, description = "Soft-deleted warehouses", body = Vec<WarehouseResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn list_deleted_warehouses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state.warehouses.list_deleted().await?;
    let body: Vec<WarehouseResponse> = warehouses.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/warehouse/{id}",
    params(("id" = i32, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse found", body = WarehouseResponse),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.warehouses.get(id).await?;
    Ok(Json(WarehouseResponse::from(warehouse)))
}

#[utoipa::path(
    get,
    path = "/warehouse/{id}/products",
    params(("id" = i32, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse with the products it stocks", body = WarehouseDetailResponse),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn get_warehouse_products(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.warehouses.get_with_products(id).await?;
    Ok(Json(WarehouseDetailResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/warehouse",
    request_body = WarehouseInput,
    responses(
        (status = 201, description = "Warehouse created", body = WarehouseResponse),
        (status = 400, description = "Invalid name", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(input): Json<WarehouseInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.warehouses.create(input).await?;
    Ok((StatusCode::CREATED, Json(WarehouseResponse::from(warehouse))))
}

#[utoipa::path(
    put,
    path = "/warehouse/{id}",
    params(("id" = i32, Path, description = "Warehouse id")),
    request_body = WarehouseInput,
    responses(
        (status = 200, description = "Warehouse renamed", body = WarehouseResponse),
        (status = 400, description = "Invalid name", body = crate::errors::ErrorResponse),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<WarehouseInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.warehouses.update(id, input).await?;
    Ok(Json(WarehouseResponse::from(warehouse)))
}

#[utoipa::path(
    delete,
    path = "/warehouse/{id}",
    params(("id" = i32, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse soft-deleted", body = WarehouseDeletedResponse),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Warehouse still holds stock", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Warehouses"
)]
pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.warehouses.delete(id).await?;
    Ok(Json(WarehouseDeletedResponse {
        message: "Warehouse deleted successfully".to_string(),
        warehouse: warehouse.into(),
    }))
}

/// Warehouse routes: reads for owners and managers, writes owner-only.
pub fn warehouse_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/all", get(list_warehouses))
        .route("/all/active", get(list_active_warehouses))
        .route("/all/deleted", get(list_deleted_warehouses))
        .route("/:id", get(get_warehouse))
        .route("/:id/products", get(get_warehouse_products))
        .route_layer(middleware::from_fn_with_state(
            super::STAFF,
            require_roles,
        ));

    let writes = Router::new()
        .route("/", post(create_warehouse))
        .route("/:id", put(update_warehouse))
        .route("/:id", delete(delete_warehouse))
        .route_layer(middleware::from_fn_with_state(
            super::OWNER_ONLY,
            require_roles,
        ));

    reads.merge(writes)
}
