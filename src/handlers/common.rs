//! Response DTOs shared across handlers.
//!
//! The wire format is camelCase with timestamps rendered as local Jakarta
//! time (`YYYY-MM-DD HH:mm:ss`), the format the frontend has always shown.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::stock_movement::MovementType;
use crate::entities::{product, product_warehouse, warehouse};
use crate::services::stock::MovementReceipt;

/// Render a UTC timestamp as Jakarta wall-clock time. Jakarta is UTC+7 with
/// no daylight saving.
pub fn format_jakarta(ts: DateTime<Utc>) -> String {
    (ts + Duration::hours(7)).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseResponse {
    pub id: i32,
    #[schema(example = "Central Hub")]
    pub name: String,
    pub total_stock: i32,
    pub is_deleted: bool,
    #[schema(example = "2024-03-01 17:00:00")]
    pub created_at: String,
    #[schema(example = "2024-03-01 17:00:00")]
    pub updated_at: String,
}

impl From<warehouse::Model> for WarehouseResponse {
    fn from(model: warehouse::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            total_stock: model.total_stock,
            is_deleted: model.is_deleted,
            created_at: format_jakarta(model.created_at),
            updated_at: format_jakarta(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    #[schema(example = "Keyboard")]
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 15.5)]
    pub price: Decimal,
    pub is_deleted: bool,
    #[schema(example = "2024-03-01 17:00:00")]
    pub created_at: String,
    #[schema(example = "2024-03-01 17:00:00")]
    pub updated_at: String,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            is_deleted: model.is_deleted,
            created_at: format_jakarta(model.created_at),
            updated_at: format_jakarta(model.updated_at),
        }
    }
}

/// A bare stock relation, as returned right after product creation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockRelationResponse {
    pub product_id: i32,
    pub warehouse_id: i32,
    pub stock: i32,
}

impl From<product_warehouse::Model> for StockRelationResponse {
    fn from(model: product_warehouse::Model) -> Self {
        Self {
            product_id: model.product_id,
            warehouse_id: model.warehouse_id,
            stock: model.stock,
        }
    }
}

/// A stock relation joined with its warehouse.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockWithWarehouseResponse {
    pub product_id: i32,
    pub warehouse_id: i32,
    pub stock: i32,
    pub warehouse: Option<WarehouseResponse>,
}

impl From<(product_warehouse::Model, Option<warehouse::Model>)> for StockWithWarehouseResponse {
    fn from((relation, warehouse): (product_warehouse::Model, Option<warehouse::Model>)) -> Self {
        Self {
            product_id: relation.product_id,
            warehouse_id: relation.warehouse_id,
            stock: relation.stock,
            warehouse: warehouse.map(Into::into),
        }
    }
}

/// A stock relation joined with its product.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockWithProductResponse {
    pub product_id: i32,
    pub warehouse_id: i32,
    pub stock: i32,
    pub product: Option<ProductResponse>,
}

impl From<(product_warehouse::Model, Option<product::Model>)> for StockWithProductResponse {
    fn from((relation, product): (product_warehouse::Model, Option<product::Model>)) -> Self {
        Self {
            product_id: relation.product_id,
            warehouse_id: relation.warehouse_id,
            stock: relation.stock,
            product: product.map(Into::into),
        }
    }
}

/// A product with its full stock distribution.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub product_stock: Vec<StockWithWarehouseResponse>,
}

impl From<crate::services::products::ProductWithStock> for ProductDetailResponse {
    fn from((product, stock): crate::services::products::ProductWithStock) -> Self {
        Self {
            product: product.into(),
            product_stock: stock.into_iter().map(Into::into).collect(),
        }
    }
}

/// A freshly created product with its bare stock relations.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreatedResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub product_stock: Vec<StockRelationResponse>,
}

impl From<(product::Model, Vec<product_warehouse::Model>)> for ProductCreatedResponse {
    fn from((product, relations): (product::Model, Vec<product_warehouse::Model>)) -> Self {
        Self {
            product: product.into(),
            product_stock: relations.into_iter().map(Into::into).collect(),
        }
    }
}

/// A warehouse with the products it stocks.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseDetailResponse {
    #[serde(flatten)]
    pub warehouse: WarehouseResponse,
    pub product_stock: Vec<StockWithProductResponse>,
}

impl From<crate::services::warehouses::WarehouseWithStock> for WarehouseDetailResponse {
    fn from((warehouse, stock): crate::services::warehouses::WarehouseWithStock) -> Self {
        Self {
            warehouse: warehouse.into(),
            product_stock: stock.into_iter().map(Into::into).collect(),
        }
    }
}

/// A committed ledger entry with the product and warehouse as they stand
/// after the movement.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    pub id: i32,
    pub product_id: i32,
    pub warehouse_id: i32,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub amount: i32,
    #[schema(example = "2024-03-01 17:00:00")]
    pub created_at: String,
    #[schema(example = "2024-03-01 17:00:00")]
    pub updated_at: String,
    pub product: ProductResponse,
    pub warehouse: WarehouseResponse,
}

impl From<MovementReceipt> for MovementResponse {
    fn from(receipt: MovementReceipt) -> Self {
        Self {
            id: receipt.movement.id,
            product_id: receipt.movement.product_id,
            warehouse_id: receipt.movement.warehouse_id,
            movement_type: receipt.movement.movement_type,
            amount: receipt.movement.amount,
            created_at: format_jakarta(receipt.movement.created_at),
            updated_at: format_jakarta(receipt.movement.updated_at),
            product: receipt.product.into(),
            warehouse: receipt.warehouse.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn jakarta_formatting_adds_seven_hours() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(format_jakarta(ts), "2024-03-01 17:00:00");
    }

    #[test]
    fn jakarta_formatting_rolls_over_midnight() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 20, 30, 5).unwrap();
        assert_eq!(format_jakarta(ts), "2024-03-02 03:30:05");
    }

    #[test]
    fn product_price_serializes_as_a_json_number() {
        let model = product::Model {
            id: 1,
            name: "Keyboard".into(),
            price: dec!(15.50),
            is_deleted: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(ProductResponse::from(model)).unwrap();
        assert_eq!(json["price"], serde_json::json!(15.5));
        assert_eq!(json["createdAt"], "2024-03-01 17:00:00");
    }

    #[test]
    fn detail_response_flattens_product_fields() {
        let product = product::Model {
            id: 7,
            name: "Mouse".into(),
            price: dec!(8),
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let relation = product_warehouse::Model {
            product_id: 7,
            warehouse_id: 2,
            stock: 12,
        };
        let json = serde_json::to_value(ProductDetailResponse::from((
            product,
            vec![(relation, None)],
        )))
        .unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["productStock"][0]["warehouseId"], 2);
        assert_eq!(json["productStock"][0]["stock"], 12);
    }
}
