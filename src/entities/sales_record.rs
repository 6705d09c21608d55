use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Archived copy of an order removed by the cleanup job.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub original_order_id: Uuid,
    pub order_number: String,
    pub branch_id: Uuid,
    pub table_id: Option<Uuid>,
    pub order_type: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub customer_name: Option<String>,
    pub ordered_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_record_item::Entity")]
    Items,
}

impl Related<super::sales_record_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
