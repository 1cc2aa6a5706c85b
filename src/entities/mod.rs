pub mod product;
pub mod product_warehouse;
pub mod stock_movement;
pub mod warehouse;

pub use product::Entity as Product;
pub use product_warehouse::Entity as ProductWarehouse;
pub use stock_movement::Entity as StockMovement;
pub use warehouse::Entity as Warehouse;
