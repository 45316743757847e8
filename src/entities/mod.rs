pub mod historical_performance;
pub mod purchase_order;
pub mod user;
pub mod vendor;
