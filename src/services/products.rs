use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::{product, product_warehouse, warehouse, Product, ProductWarehouse, Warehouse};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::validation;

/// A product together with its stock relations and their warehouses.
pub type ProductWithStock = (
    product::Model,
    Vec<(product_warehouse::Model, Option<warehouse::Model>)>,
);

/// One requested stock allocation inside a product payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationInput {
    #[schema(example = 1)]
    pub warehouse_id: Option<i32>,
    #[schema(example = 50)]
    pub stock: Option<i32>,
}

/// Payload for creating a product. Allocations are optional on create.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProductInput {
    #[schema(example = "Keyboard")]
    pub name: Option<String>,
    #[schema(value_type = Option<f64>, example = 15.5)]
    pub price: Option<Decimal>,
    pub warehouses: Option<Vec<AllocationInput>>,
}

/// Payload for updating a product. The allocation array is mandatory and is
/// the complete desired stock distribution, not a patch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProductInput {
    #[schema(example = "Keyboard")]
    pub name: Option<String>,
    #[schema(value_type = Option<f64>, example = 15.5)]
    pub price: Option<Decimal>,
    pub warehouses: Option<Vec<AllocationInput>>,
}

/// Service for the product catalog and its stock distribution
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn stock_for(&self, product_id: i32) -> Result<Vec<(product_warehouse::Model, Option<warehouse::Model>)>, ServiceError> {
        let stock = ProductWarehouse::find()
            .filter(product_warehouse::Column::ProductId.eq(product_id))
            .find_also_related(Warehouse)
            .all(&*self.db)
            .await?;
        Ok(stock)
    }

    async fn list_with_stock(
        &self,
        products: Vec<product::Model>,
    ) -> Result<Vec<ProductWithStock>, ServiceError> {
        let mut result = Vec::with_capacity(products.len());
        for p in products {
            let stock = self.stock_for(p.id).await?;
            result.push((p, stock));
        }
        Ok(result)
    }

    /// List every product, deleted ones included.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProductWithStock>, ServiceError> {
        let products = Product::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        self.list_with_stock(products).await
    }

    /// List products that have not been soft-deleted.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<ProductWithStock>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        self.list_with_stock(products).await
    }

    /// List soft-deleted products.
    #[instrument(skip(self))]
    pub async fn list_deleted(&self) -> Result<Vec<ProductWithStock>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::IsDeleted.eq(true))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        self.list_with_stock(products).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<ProductWithStock, ServiceError> {
        let product = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        let stock = self.stock_for(id).await?;
        Ok((product, stock))
    }

    /// Create a product and, when allocations are given, its initial stock
    /// distribution. Every referenced warehouse is checked inside the
    /// transaction before the first write, so a bad allocation leaves
    /// nothing behind.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CreateProductInput,
    ) -> Result<(product::Model, Vec<product_warehouse::Model>), ServiceError> {
        let (name, price) =
            validation::validate_product_create(input.name.as_deref(), input.price)?;
        let allocations = input.warehouses.unwrap_or_default();

        let (product, relations) = self
            .db
            .transaction::<_, (product::Model, Vec<product_warehouse::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let mut resolved = Vec::with_capacity(allocations.len());
                        for alloc in &allocations {
                            let warehouse_id =
                                validation::require_allocation_warehouse(alloc.warehouse_id)?;
                            let warehouse = Warehouse::find_by_id(warehouse_id)
                                .one(txn)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::NotFound(format!(
                                        "Warehouse with ID {} not found",
                                        warehouse_id
                                    ))
                                })?;
                            if warehouse.is_deleted {
                                return Err(ServiceError::NotFound(format!(
                                    "Warehouse with ID {} is no longer available",
                                    warehouse_id
                                )));
                            }
                            let stock = validation::validate_allocation_stock(alloc.stock)?;
                            resolved.push((warehouse, stock));
                        }

                        let now = Utc::now();
                        let product = product::ActiveModel {
                            name: Set(name),
                            price: Set(price),
                            is_deleted: Set(false),
                            created_at: Set(now),
                            updated_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;

                        let mut relations = Vec::with_capacity(resolved.len());
                        for (warehouse, stock) in resolved {
                            let relation = product_warehouse::ActiveModel {
                                product_id: Set(product.id),
                                warehouse_id: Set(warehouse.id),
                                stock: Set(stock),
                            }
                            .insert(txn)
                            .await?;

                            let new_total = warehouse.total_stock + stock;
                            let mut wh: warehouse::ActiveModel = warehouse.into();
                            wh.total_stock = Set(new_total);
                            wh.updated_at = Set(Utc::now());
                            wh.update(txn).await?;

                            relations.push(relation);
                        }

                        Ok((product, relations))
                    })
                },
            )
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send(Event::ProductCreated(product.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(product_id = product.id, "Product created");
        Ok((product, relations))
    }

    /// Replace a product's fields and entire stock distribution.
    ///
    /// The submitted allocation array is the complete desired state: current
    /// relations absent from it are removed (their stock released from the
    /// warehouse total), the rest are upserted with the stock delta applied
    /// to the warehouse total. All of it commits or none of it does.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        input: UpdateProductInput,
    ) -> Result<ProductWithStock, ServiceError> {
        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let (name, price) = validation::validate_product_update(
            input.name.as_deref(),
            input.price,
            input.warehouses.is_some(),
        )?;
        let allocations = input.warehouses.unwrap_or_default();

        let (product, stock) = self
            .db
            .transaction::<_, ProductWithStock, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Snapshot of the current distribution, read inside the
                    // transaction so deltas are computed against the same
                    // state the writes land on.
                    let current = ProductWarehouse::find()
                        .filter(product_warehouse::Column::ProductId.eq(id))
                        .all(txn)
                        .await?;

                    let mut am: product::ActiveModel = existing.into();
                    am.name = Set(name);
                    am.price = Set(price);
                    am.updated_at = Set(Utc::now());
                    am.update(txn).await?;

                    // Allocations without a warehouse id cannot shield any
                    // current relation from removal; they fail below anyway.
                    let new_ids: Vec<i32> =
                        allocations.iter().filter_map(|a| a.warehouse_id).collect();

                    for removed in current.iter().filter(|r| !new_ids.contains(&r.warehouse_id)) {
                        let warehouse = Warehouse::find_by_id(removed.warehouse_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::DatabaseError(DbErr::RecordNotFound(format!(
                                    "warehouse {} for stock relation",
                                    removed.warehouse_id
                                )))
                            })?;

                        let new_total = warehouse.total_stock - removed.stock;
                        let mut wh: warehouse::ActiveModel = warehouse.into();
                        wh.total_stock = Set(new_total);
                        wh.updated_at = Set(Utc::now());
                        wh.update(txn).await?;

                        ProductWarehouse::delete_by_id((id, removed.warehouse_id))
                            .exec(txn)
                            .await?;
                    }

                    for alloc in &allocations {
                        let warehouse_id =
                            validation::require_allocation_warehouse(alloc.warehouse_id)?;
                        let warehouse = Warehouse::find_by_id(warehouse_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Warehouse with ID {} not found",
                                    warehouse_id
                                ))
                            })?;
                        if warehouse.is_deleted {
                            return Err(ServiceError::NotFound(format!(
                                "Warehouse with ID {} is no longer available",
                                warehouse_id
                            )));
                        }
                        let stock = validation::validate_allocation_stock(alloc.stock)?;

                        let delta = match current.iter().find(|r| r.warehouse_id == warehouse_id) {
                            Some(relation) => {
                                let mut rel: product_warehouse::ActiveModel =
                                    relation.clone().into();
                                rel.stock = Set(stock);
                                rel.update(txn).await?;
                                stock - relation.stock
                            }
                            None => {
                                product_warehouse::ActiveModel {
                                    product_id: Set(id),
                                    warehouse_id: Set(warehouse_id),
                                    stock: Set(stock),
                                }
                                .insert(txn)
                                .await?;
                                stock
                            }
                        };

                        let new_total = warehouse.total_stock + delta;
                        let mut wh: warehouse::ActiveModel = warehouse.into();
                        wh.total_stock = Set(new_total);
                        wh.updated_at = Set(Utc::now());
                        wh.update(txn).await?;
                    }

                    let product = Product::find_by_id(id).one(txn).await?.ok_or_else(|| {
                        ServiceError::InternalError("Product disappeared during update".to_string())
                    })?;
                    let stock = ProductWarehouse::find()
                        .filter(product_warehouse::Column::ProductId.eq(id))
                        .find_also_related(Warehouse)
                        .all(txn)
                        .await?;

                    Ok((product, stock))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send(Event::ProductUpdated(product.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(product_id = product.id, "Product updated");
        Ok((product, stock))
    }

    /// Soft-delete a product, releasing its stock from every warehouse total
    /// and removing the stock relations. Deletion is terminal.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<product::Model, ServiceError> {
        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        if existing.is_deleted {
            return Err(ServiceError::Conflict(
                "Product has already been deleted".to_string(),
            ));
        }

        let product = self
            .db
            .transaction::<_, product::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let relations = ProductWarehouse::find()
                        .filter(product_warehouse::Column::ProductId.eq(id))
                        .all(txn)
                        .await?;

                    let mut am: product::ActiveModel = existing.into();
                    am.is_deleted = Set(true);
                    am.updated_at = Set(Utc::now());
                    let product = am.update(txn).await?;

                    for relation in &relations {
                        let warehouse = Warehouse::find_by_id(relation.warehouse_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::DatabaseError(DbErr::RecordNotFound(format!(
                                    "warehouse {} for stock relation",
                                    relation.warehouse_id
                                )))
                            })?;

                        let new_total = warehouse.total_stock - relation.stock;
                        let mut wh: warehouse::ActiveModel = warehouse.into();
                        wh.total_stock = Set(new_total);
                        wh.updated_at = Set(Utc::now());
                        wh.update(txn).await?;
                    }

                    ProductWarehouse::delete_many()
                        .filter(product_warehouse::Column::ProductId.eq(id))
                        .exec(txn)
                        .await?;

                    Ok(product)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        self.event_sender
            .send(Event::ProductDeleted(product.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(product_id = product.id, "Product soft-deleted");
        Ok(product)
    }
}
