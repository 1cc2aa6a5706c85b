//! StockTrack API Library
//!
//! Warehouse stock tracking backend: products, the warehouses that hold them,
//! and an append-only purchase/sales movement ledger. Aggregate counts
//! (`warehouse.totalStock`, per-relation `stock`) are updated in the same
//! transaction as the ledger rows so they never drift apart.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use sea_orm::DatabaseConnection;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::auth::{AuthConfig, AuthService};
use crate::events::EventSender;
use crate::services::{ProductService, StockService, UserService, WarehouseService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub auth_service: Arc<AuthService>,
    pub warehouses: WarehouseService,
    pub products: ProductService,
    pub stock: StockService,
    pub users: UserService,
}

impl AppState {
    /// Wires every service against the shared connection pool and event
    /// channel. The JWT configuration is derived from `config`.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: EventSender,
    ) -> Self {
        let auth_config = AuthConfig::new(
            config.jwt_secret.clone(),
            Duration::from_secs(config.jwt_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_config));
        let events = Arc::new(event_sender);

        Self {
            warehouses: WarehouseService::new(db.clone(), events.clone()),
            products: ProductService::new(db.clone(), events.clone()),
            stock: StockService::new(db.clone(), events.clone()),
            users: UserService::new(db.clone(), events, auth_service.clone()),
            db,
            config,
            auth_service,
        }
    }
}

/// The authenticated API surface: every route under `/warehouse`, `/products`,
/// `/purchase` and `/sales` requires a valid bearer token, with role gates
/// applied per route group inside each handler module. `/auth` stays public.
pub fn api_routes(auth_service: Arc<AuthService>) -> Router<AppState> {
    let protected = Router::new()
        .nest("/warehouse", handlers::warehouses::warehouse_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/purchase", handlers::purchases::purchase_routes())
        .nest("/sales", handlers::sales::sales_routes())
        .layer(middleware::from_fn_with_state(
            auth_service,
            auth::auth_middleware,
        ));

    Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .merge(protected)
}

/// Builds the complete application router: API, health probes, metrics and
/// Swagger UI. `main` layers CORS on top of this from its runtime config;
/// tests drive it directly.
pub fn app_router(state: AppState) -> Router {
    let api = api_routes(state.auth_service.clone()).with_state(state.clone());

    Router::new()
        .route("/", get(|| async { "stocktrack-api up" }))
        .merge(api)
        .merge(health::health_routes(state.db.clone()))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}
