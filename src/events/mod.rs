use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::entities::stock_movement::MovementType;

/// Cloneable handle used by services to emit domain events.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// The events that can occur in the system. Movement events carry enough
// context to reconstruct the ledger entry they mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Warehouse events
    WarehouseCreated(i32),
    WarehouseUpdated(i32),
    WarehouseDeleted(i32),

    // Product events
    ProductCreated(i32),
    ProductUpdated(i32),
    ProductDeleted(i32),

    // Stock ledger events
    StockMoved {
        product_id: i32,
        warehouse_id: i32,
        movement_type: MovementType,
        amount: i32,
    },

    // Account events
    UserRegistered(i32),
}

/// Drains the event channel, logging each event as it arrives. Runs for the
/// lifetime of the channel; exits when every sender has been dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockMoved {
                product_id,
                warehouse_id,
                movement_type,
                amount,
            } => {
                info!(
                    product_id,
                    warehouse_id,
                    amount,
                    movement_type = ?movement_type,
                    "Stock movement recorded"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}
