use super::{lifecycle, load_order, store_and_recompute};
use crate::{
    commands::Command,
    db::{self, DbPool},
    entities::purchase_order,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Whether the acknowledgment was recorded now or had been recorded before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AcknowledgeOutcome {
    Acknowledged(purchase_order::Model),
    AlreadyAcknowledged(purchase_order::Model),
}

impl AcknowledgeOutcome {
    pub fn order(&self) -> &purchase_order::Model {
        match self {
            Self::Acknowledged(order) | Self::AlreadyAcknowledged(order) => order,
        }
    }

    pub fn into_order(self) -> purchase_order::Model {
        match self {
            Self::Acknowledged(order) | Self::AlreadyAcknowledged(order) => order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgePurchaseOrderCommand {
    pub id: Uuid,
}

#[async_trait::async_trait]
impl Command for AcknowledgePurchaseOrderCommand {
    type Result = AcknowledgeOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let id = self.id;
        let (outcome, recompute) = db::transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let current = load_order(txn, id).await?;
                let now = Utc::now();
                match lifecycle::plan_acknowledgment(&current, now)? {
                    None => Ok((AcknowledgeOutcome::AlreadyAcknowledged(current), None)),
                    Some(next) => {
                        let (saved, recompute) = store_and_recompute(txn, next, now).await?;
                        Ok((AcknowledgeOutcome::Acknowledged(saved), Some(recompute)))
                    }
                }
            })
        })
        .await
        .map_err(|e| {
            crate::metrics::record_command_failure("acknowledge_purchase_order");
            e
        })?;

        if let Some(recompute) = recompute {
            event_sender
                .send_or_log(Event::PurchaseOrderAcknowledged(id))
                .await;
            event_sender.send_or_log(recompute.event()).await;
            info!(purchase_order_id = %id, "purchase order acknowledged");
        }
        Ok(outcome)
    }
}
