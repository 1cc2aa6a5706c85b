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

use super::common::{ProductCreatedResponse, ProductDetailResponse, ProductResponse};
use crate::auth::require_roles;
use crate::errors::ServiceError;
use crate::services::products::{CreateProductInput, UpdateProductInput};
use crate::AppState;

/// Body of a successful product deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDeletedResponse {
    pub product: ProductResponse,
    #[schema(example = "Product deleted successfully")]
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/products/all",
    responses(
        (status = 200, description = "All products with their stock distribution", body = Vec<ProductDetailResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.products.list().await?;
    let body: Vec<ProductDetailResponse> = products.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/products/all/active",
    responses(
        (status = 200, description = "Products that are not soft-deleted", body = Vec<ProductDetailResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_active_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.products.list_active().await?;
    let body: Vec<ProductDetailResponse> = products.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/products/all/deleted",
    responses(
        (status = 200, description = "Soft-deleted products", body = Vec<ProductDetailResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn list_deleted_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.products.list_deleted().await?;
    let body: Vec<ProductDetailResponse> = products.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductDetailResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.get(id).await?;
    Ok(Json(ProductDetailResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductCreatedResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Allocation names an unknown or deleted warehouse", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.products.create(input).await?;
    Ok((StatusCode::CREATED, Json(ProductCreatedResponse::from(created))))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product and stock distribution replaced", body = ProductDetailResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or referenced warehouse not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.products.update(id, input).await?;
    Ok(Json(ProductDetailResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product soft-deleted", body = ProductDeletedResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product already deleted", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.products.delete(id).await?;
    Ok(Json(ProductDeletedResponse {
        product: product.into(),
        message: "Product deleted successfully".to_string(),
    }))
}

/// Product routes: owners and managers run the catalog, deletion is
/// owner-only.
pub fn product_routes() -> Router<AppState> {
    let staff = Router::new()
        .route("/all", get(list_products))
        .route("/all/active", get(list_active_products))
        .route("/all/deleted", get(list_deleted_products))
        .route("/:id", get(get_product))
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route_layer(middleware::from_fn_with_state(super::STAFF, require_roles));

    let owner = Router::new()
        .route("/:id", delete(delete_product))
        .route_layer(middleware::from_fn_with_state(
            super::OWNER_ONLY,
            require_roles,
        ));

    staff.merge(owner)
}
