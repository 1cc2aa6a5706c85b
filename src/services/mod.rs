//! Business logic for the inventory API.
//!
//! Each service owns one aggregate: warehouses, the product catalog, the
//! stock ledger (purchases and sales), and user accounts. Services hold a
//! shared database handle plus the event sender, run their multi-row writes
//! inside transactions, and surface failures as [`crate::errors::ServiceError`].

pub mod products;
pub mod stock;
pub mod users;
pub mod warehouses;

pub use products::ProductService;
pub use stock::StockService;
pub use users::UserService;
pub use warehouses::WarehouseService;
