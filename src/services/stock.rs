use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, IntCounter};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::stock_movement::MovementType;
use crate::entities::{
    product, product_warehouse, stock_movement, warehouse, Product, ProductWarehouse, Warehouse,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::validation::{self, RelationLookup};

lazy_static! {
    static ref PURCHASES_RECORDED: IntCounter = register_int_counter!(
        "stock_purchases_total",
        "Total number of purchase movements recorded"
    )
    .expect("metric can be created");
    static ref SALES_RECORDED: IntCounter = register_int_counter!(
        "stock_sales_total",
        "Total number of sales movements recorded"
    )
    .expect("metric can be created");
}

/// Payload for a purchase or sale against one product.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementInput {
    #[schema(example = 5)]
    pub value: Option<i32>,
    #[schema(example = 1)]
    pub warehouse_id: Option<i32>,
}

/// A committed ledger entry joined with the product and the warehouse as
/// they stand after the movement was applied.
#[derive(Debug, Clone)]
pub struct MovementReceipt {
    pub movement: stock_movement::Model,
    pub product: product::Model,
    pub warehouse: warehouse::Model,
}

/// Service for the stock ledger: records purchases and sales while keeping
/// relation stock and warehouse totals consistent with the movement log.
#[derive(Clone)]
pub struct StockService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl StockService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Record a purchase: stock arrives at a warehouse for a product.
    ///
    /// Creates the stock relation on first purchase, otherwise increments it.
    /// The warehouse total and the ledger entry commit in the same
    /// transaction as the relation change.
    #[instrument(skip(self, input))]
    pub async fn purchase(
        &self,
        product_id: i32,
        input: MovementInput,
    ) -> Result<MovementReceipt, ServiceError> {
        let (value, warehouse_id) = validation::validate_purchase(input.value, input.warehouse_id)?;

        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        if product.is_deleted {
            return Err(ServiceError::ValidationError(
                "Product has been deleted".to_string(),
            ));
        }

        let receipt = self
            .db
            .transaction::<_, MovementReceipt, ServiceError>(move |txn| {
                Box::pin(async move {
                    let warehouse = Warehouse::find_by_id(warehouse_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::DatabaseError(DbErr::RecordNotFound(format!(
                                "warehouse {} for purchase",
                                warehouse_id
                            )))
                        })?;

                    match ProductWarehouse::find_by_id((product_id, warehouse_id))
                        .one(txn)
                        .await?
                    {
                        Some(relation) => {
                            let new_stock = relation.stock + value;
                            let mut rel: product_warehouse::ActiveModel = relation.into();
                            rel.stock = Set(new_stock);
                            rel.update(txn).await?;
                        }
                        None => {
                            product_warehouse::ActiveModel {
                                product_id: Set(product_id),
                                warehouse_id: Set(warehouse_id),
                                stock: Set(value),
                            }
                            .insert(txn)
                            .await?;
                        }
                    }

                    let new_total = warehouse.total_stock + value;
                    let mut wh: warehouse::ActiveModel = warehouse.into();
                    wh.total_stock = Set(new_total);
                    wh.updated_at = Set(Utc::now());
                    let warehouse = wh.update(txn).await?;

                    let now = Utc::now();
                    let movement = stock_movement::ActiveModel {
                        product_id: Set(product_id),
                        warehouse_id: Set(warehouse_id),
                        movement_type: Set(MovementType::Purchase),
                        amount: Set(value),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let product = Product::find_by_id(product_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Product not found".to_string())
                        })?;

                    Ok(MovementReceipt {
                        movement,
                        product,
                        warehouse,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        PURCHASES_RECORDED.inc();
        self.event_sender
            .send(Event::StockMoved {
                product_id,
                warehouse_id,
                movement_type: MovementType::Purchase,
                amount: value,
            })
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(product_id, warehouse_id, amount = value, "Purchase recorded");
        Ok(receipt)
    }

    /// Record a sale: stock leaves a warehouse for a product.
    ///
    /// Requires an existing stock relation with enough stock. The relation
    /// is re-read inside the transaction and the sufficiency check repeated
    /// there, so two concurrent sales cannot both spend the same stock.
    #[instrument(skip(self, input))]
    pub async fn sale(
        &self,
        product_id: i32,
        input: MovementInput,
    ) -> Result<MovementReceipt, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        let relations = ProductWarehouse::find()
            .filter(product_warehouse::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?;

        let lookup = match input.warehouse_id {
            Some(id) if id != 0 => match relations.iter().find(|r| r.warehouse_id == id) {
                Some(relation) => RelationLookup::Found(relation),
                None => RelationLookup::Missing,
            },
            _ => RelationLookup::Unqueried,
        };
        let (warehouse_id, value) =
            validation::validate_sale(&product, input.warehouse_id, lookup, input.value)?;

        let receipt = self
            .db
            .transaction::<_, MovementReceipt, ServiceError>(move |txn| {
                Box::pin(async move {
                    let relation = ProductWarehouse::find_by_id((product_id, warehouse_id))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Warehouse relation not found".to_string())
                        })?;
                    if relation.stock < value {
                        return Err(ServiceError::InsufficientStock(
                            "Stock not enough to do sales".to_string(),
                        ));
                    }

                    let new_stock = relation.stock - value;
                    let mut rel: product_warehouse::ActiveModel = relation.into();
                    rel.stock = Set(new_stock);
                    rel.update(txn).await?;

                    let warehouse = Warehouse::find_by_id(warehouse_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::DatabaseError(DbErr::RecordNotFound(format!(
                                "warehouse {} for sale",
                                warehouse_id
                            )))
                        })?;
                    let new_total = warehouse.total_stock - value;
                    let mut wh: warehouse::ActiveModel = warehouse.into();
                    wh.total_stock = Set(new_total);
                    wh.updated_at = Set(Utc::now());
                    let warehouse = wh.update(txn).await?;

                    let now = Utc::now();
                    let movement = stock_movement::ActiveModel {
                        product_id: Set(product_id),
                        warehouse_id: Set(warehouse_id),
                        movement_type: Set(MovementType::Sales),
                        amount: Set(value),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let product = Product::find_by_id(product_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound("Product not found".to_string())
                        })?;

                    Ok(MovementReceipt {
                        movement,
                        product,
                        warehouse,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        SALES_RECORDED.inc();
        self.event_sender
            .send(Event::StockMoved {
                product_id,
                warehouse_id,
                movement_type: MovementType::Sales,
                amount: value,
            })
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(product_id, warehouse_id, amount = value, "Sale recorded");
        Ok(receipt)
    }
}
