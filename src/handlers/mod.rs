pub mod auth;
pub mod common;
pub mod health;
pub mod performance;
pub mod purchase_orders;
pub mod vendors;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        performance::PerformanceService, purchase_orders::PurchaseOrderService,
        vendors::VendorService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub vendors: Arc<VendorService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub performance: Arc<PerformanceService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            vendors: Arc::new(VendorService::new(db_pool.clone(), event_sender.clone())),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            performance: Arc::new(PerformanceService::new(db_pool, event_sender)),
        }
    }
}
