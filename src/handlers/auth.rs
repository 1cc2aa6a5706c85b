use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::UserRole;
use crate::errors::ServiceError;
use crate::services::users::{LoginInput, RegisterInput};
use crate::AppState;

/// Body of a successful registration.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "Registration success can continue to login step")]
    pub success: String,
    pub id: i32,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub role: UserRole,
}

/// Body of a successful login.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid payload or email already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state.users.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: "Registration success can continue to login step".to_string(),
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing or wrong credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let (_, token) = state.users.authenticate(input).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

/// Public auth routes: registration and login sit outside the token gate.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
