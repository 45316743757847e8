use crate::entities::purchase_order::PurchaseOrderStatus;
use crate::performance::PerformanceMetrics;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event after a commit; a closed channel is logged, not returned.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Domain events emitted after a command commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    VendorCreated(Uuid),
    VendorUpdated(Uuid),
    VendorDeleted(Uuid),

    PurchaseOrderCreated {
        purchase_order_id: Uuid,
        vendor_id: Uuid,
    },
    PurchaseOrderUpdated(Uuid),
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: PurchaseOrderStatus,
        new_status: PurchaseOrderStatus,
    },
    PurchaseOrderAcknowledged(Uuid),
    PurchaseOrderDeleted {
        purchase_order_id: Uuid,
        vendor_id: Uuid,
    },

    VendorMetricsRecomputed {
        vendor_id: Uuid,
        metrics_version: i32,
        metrics: PerformanceMetrics,
    },
}

/// Drains the event channel, logging each event until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status,
            } => info!(
                %purchase_order_id,
                %old_status,
                %new_status,
                "purchase order status changed"
            ),
            Event::VendorMetricsRecomputed {
                vendor_id,
                metrics_version,
                metrics,
            } => info!(
                %vendor_id,
                metrics_version,
                on_time_delivery_rate = metrics.on_time_delivery_rate,
                quality_rating_average = metrics.quality_rating_average,
                average_response_time = metrics.average_response_time,
                fulfilment_rate = metrics.fulfilment_rate,
                "vendor metrics recomputed"
            ),
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}
