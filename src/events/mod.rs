use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::order::OrderStatus;
use crate::metrics::BUSINESS_METRICS;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; a closed or full channel is logged and otherwise ignored.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Failed to send event: {}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderPlaced {
        order_id: Uuid,
        branch_id: Uuid,
        order_number: String,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderCancelled {
        order_id: Uuid,
        reason: Option<String>,
    },
    TableCollected {
        table_id: Uuid,
        payment_id: Uuid,
        amount: Decimal,
        order_count: usize,
    },
    OrdersArchived {
        count: u64,
    },
}

/// Creates the channel used by services to publish events.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        handle_event(&event);
    }

    info!("Event channel closed, stopping event processing");
}

fn handle_event(event: &Event) {
    match event {
        Event::OrderPlaced {
            order_id,
            branch_id,
            order_number,
            total_amount,
        } => {
            info!(%order_id, %branch_id, %order_number, %total_amount, "Order placed");
            BUSINESS_METRICS.record_order_placed();
        }
        Event::OrderStatusChanged {
            order_id,
            old_status,
            new_status,
        } => {
            info!(%order_id, %old_status, %new_status, "Order status changed");
            if *new_status == OrderStatus::Completed {
                BUSINESS_METRICS.record_orders_completed(1);
            }
        }
        Event::OrderCancelled { order_id, reason } => {
            info!(%order_id, reason = reason.as_deref().unwrap_or("-"), "Order cancelled");
            BUSINESS_METRICS.record_order_cancelled();
        }
        Event::TableCollected {
            table_id,
            payment_id,
            amount,
            order_count,
        } => {
            info!(%table_id, %payment_id, %amount, order_count, "Table collected");
            BUSINESS_METRICS.record_table_collected(*amount);
            BUSINESS_METRICS.record_orders_completed(*order_count as u64);
        }
        Event::OrdersArchived { count } => {
            info!(count, "Orders archived");
            BUSINESS_METRICS.record_orders_archived(*count);
        }
    }
}
