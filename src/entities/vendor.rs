use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A supplier profile plus its materialized performance metrics.
///
/// The four metric columns are only ever written by the performance
/// recompute; `metrics_version` increments on each write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub vendor_code: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub contact_details: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub on_time_delivery_rate: f64,
    pub quality_rating_average: f64,
    pub average_response_time: f64,
    pub fulfilment_rate: f64,
    pub metrics_version: i32,
    pub metrics_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
    #[sea_orm(has_many = "super::historical_performance::Entity")]
    HistoricalPerformances,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl Related<super::historical_performance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HistoricalPerformances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
