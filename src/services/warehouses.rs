use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::{product, product_warehouse, warehouse, ProductWarehouse, Warehouse};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::validation;

/// A warehouse together with its per-product stock relations.
pub type WarehouseWithStock = (
    warehouse::Model,
    Vec<(product_warehouse::Model, Option<product::Model>)>,
);

/// Payload for creating or renaming a warehouse.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WarehouseInput {
    #[schema(example = "Central Hub")]
    pub name: Option<String>,
}

/// Service for managing warehouses
#[derive(Clone)]
pub struct WarehouseService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WarehouseService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// List every warehouse, deleted ones included.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        let warehouses = Warehouse::find()
            .order_by_asc(warehouse::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(warehouses)
    }

    /// List warehouses that have not been soft-deleted.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        let warehouses = Warehouse::find()
            .filter(warehouse::Column::IsDeleted.eq(false))
            .order_by_asc(warehouse::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(warehouses)
    }

    /// List soft-deleted warehouses.
    #[instrument(skip(self))]
    pub async fn list_deleted(&self) -> Result<Vec<warehouse::Model>, ServiceError> {
        let warehouses = Warehouse::find()
            .filter(warehouse::Column::IsDeleted.eq(true))
            .order_by_asc(warehouse::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(warehouses)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<warehouse::Model, ServiceError> {
        Warehouse::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Warehouse not found".to_string()))
    }

    /// Fetch a warehouse along with the products it currently stocks.
    #[instrument(skip(self))]
    pub async fn get_with_products(&self, id: i32) -> Result<WarehouseWithStock, ServiceError> {
        let warehouse = self.get(id).await?;
        let stock = ProductWarehouse::find()
            .filter(product_warehouse::Column::WarehouseId.eq(id))
            .find_also_related(crate::entities::Product)
            .all(&*self.db)
            .await?;
        Ok((warehouse, stock))
    }

    /// Create a warehouse. New warehouses start empty.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: WarehouseInput) -> Result<warehouse::Model, ServiceError> {
        let name = validation::validate_warehouse_name(input.name.as_deref())?;

        let now = Utc::now();
        let warehouse = warehouse::ActiveModel {
            name: Set(name),
            total_stock: Set(0),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send(Event::WarehouseCreated(warehouse.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(warehouse_id = warehouse.id, "Warehouse created");
        Ok(warehouse)
    }

    /// Rename a warehouse. The not-found check runs before the name rule so a
    /// bad id reports 404 even when the payload is also invalid.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        input: WarehouseInput,
    ) -> Result<warehouse::Model, ServiceError> {
        let existing = self.get(id).await?;
        let name = validation::validate_warehouse_name(input.name.as_deref())?;

        let mut warehouse: warehouse::ActiveModel = existing.into();
        warehouse.name = Set(name);
        warehouse.updated_at = Set(Utc::now());
        let warehouse = warehouse.update(&*self.db).await?;

        self.event_sender
            .send(Event::WarehouseUpdated(warehouse.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(warehouse_id = warehouse.id, "Warehouse updated");
        Ok(warehouse)
    }

    /// Soft-delete a warehouse. Only an empty warehouse may be deleted;
    /// deleting one that is already deleted is a no-op that succeeds again.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<warehouse::Model, ServiceError> {
        let existing = self.get(id).await?;

        if existing.total_stock > 0 {
            return Err(ServiceError::Conflict(
                "Cannot delete warehouse with existing stock please delete the product that still exist in this warehouse first"
                    .to_string(),
            ));
        }

        let mut warehouse: warehouse::ActiveModel = existing.into();
        warehouse.is_deleted = Set(true);
        warehouse.updated_at = Set(Utc::now());
        let warehouse = warehouse.update(&*self.db).await?;

        self.event_sender
            .send(Event::WarehouseDeleted(warehouse.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(warehouse_id = warehouse.id, "Warehouse soft-deleted");
        Ok(warehouse)
    }
}
