use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::Value;
use stocktrack_api::{
    auth::{user, UserRole},
    config::AppConfig,
    db,
    entities::{product, product_warehouse, warehouse, ProductWarehouse, Warehouse},
    events::{self, EventSender},
    services::products::{AllocationInput, CreateProductInput},
    services::warehouses::WarehouseInput,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database. Each instance gets its own database file so tests can
/// run in parallel.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    owner_token: String,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("stocktrack_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only_padded_out_to_64_chars".to_string(),
            3_600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, Arc::new(cfg), event_sender);
        let router = stocktrack_api::app_router(state.clone());
        let owner_token = mint_token(&state, UserRole::Owner);

        Self {
            router,
            state,
            owner_token,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Bearer token for the default owner identity.
    pub fn token(&self) -> &str {
        &self.owner_token
    }

    /// Mint a token for an arbitrary role. The role gates only read token
    /// claims, so no users row is needed.
    #[allow(dead_code)]
    pub fn token_for(&self, role: UserRole) -> String {
        mint_token(&self.state, role)
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for owner-authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Create a warehouse through the service layer.
    #[allow(dead_code)]
    pub async fn seed_warehouse(&self, name: &str) -> warehouse::Model {
        self.state
            .warehouses
            .create(WarehouseInput {
                name: Some(name.to_string()),
            })
            .await
            .expect("seed warehouse for tests")
    }

    /// Create a product with initial stock allocations through the service
    /// layer. `allocations` holds `(warehouse_id, stock)` pairs.
    #[allow(dead_code)]
    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        allocations: &[(i32, i32)],
    ) -> (product::Model, Vec<product_warehouse::Model>) {
        let warehouses = if allocations.is_empty() {
            None
        } else {
            Some(
                allocations
                    .iter()
                    .map(|&(warehouse_id, stock)| AllocationInput {
                        warehouse_id: Some(warehouse_id),
                        stock: Some(stock),
                    })
                    .collect(),
            )
        };

        self.state
            .products
            .create(CreateProductInput {
                name: Some(name.to_string()),
                price: Some(price),
                warehouses,
            })
            .await
            .expect("seed product for tests")
    }

    /// Read a warehouse row straight from the database.
    #[allow(dead_code)]
    pub async fn warehouse_row(&self, id: i32) -> warehouse::Model {
        Warehouse::find_by_id(id)
            .one(self.state.db.as_ref())
            .await
            .expect("query warehouse")
            .expect("warehouse row exists")
    }

    /// Read a stock relation straight from the database, if present.
    #[allow(dead_code)]
    pub async fn relation_row(
        &self,
        product_id: i32,
        warehouse_id: i32,
    ) -> Option<product_warehouse::Model> {
        ProductWarehouse::find_by_id((product_id, warehouse_id))
            .one(self.state.db.as_ref())
            .await
            .expect("query stock relation")
    }

    /// Assert that every warehouse total equals the sum of its stock
    /// relations. This must hold after every write, including failed ones.
    #[allow(dead_code)]
    pub async fn assert_totals_consistent(&self) {
        let warehouses = Warehouse::find()
            .all(self.state.db.as_ref())
            .await
            .expect("list warehouses");

        for w in warehouses {
            let relations = ProductWarehouse::find()
                .filter(product_warehouse::Column::WarehouseId.eq(w.id))
                .all(self.state.db.as_ref())
                .await
                .expect("list stock relations");
            let sum: i32 = relations.iter().map(|r| r.stock).sum();
            assert_eq!(
                w.total_stock, sum,
                "warehouse {} total drifted from its stock relations",
                w.id
            );
        }
    }
}

fn mint_token(state: &AppState, role: UserRole) -> String {
    let account = user::Model {
        id: 1,
        name: "Test User".to_string(),
        email: format!("{}@example.com", role),
        password_hash: String::new(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    state
        .auth_service
        .generate_token(&account)
        .expect("failed to mint test token")
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
