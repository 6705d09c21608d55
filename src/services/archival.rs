use crate::{
    auth::AuthUser,
    entities::{order, order::OrderStatus, order_item, sales_record, sales_record_item},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{orders::load_items, tables::release_table_if_idle},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::IntoParams;
use uuid::Uuid;

/// Statuses that are archivable for every order type
pub const ARCHIVABLE: [OrderStatus; 2] = [OrderStatus::Completed, OrderStatus::Cancelled];

/// Finished orders that no longer count against a table bill. A DELIVERED
/// dine-in order stays on its table until the bill is collected.
fn archivable() -> Condition {
    Condition::any()
        .add(order::Column::Status.is_in(OrderStatus::as_strs(&ARCHIVABLE)))
        .add(
            Condition::all()
                .add(order::Column::Status.eq(OrderStatus::Delivered.to_string()))
                .add(order::Column::TableId.is_null()),
        )
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SalesRecordQuery {
    pub branch_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecordResponse {
    #[serde(flatten)]
    pub record: sales_record::Model,
    pub items: Vec<sales_record_item::Model>,
}

/// Moves old, finished orders into the sales archive
#[derive(Clone)]
pub struct ArchivalService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    archive_after: Duration,
}

impl ArchivalService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        archive_after_hours: i64,
    ) -> Self {
        Self {
            db,
            event_sender,
            archive_after: Duration::hours(archive_after_hours),
        }
    }

    /// Copies every finished order older than the threshold into
    /// `sales_records` and removes it. Runs as a single transaction: either
    /// every order is archived or none is.
    #[instrument(skip(self))]
    pub async fn archive_stale_orders(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let cutoff = now - self.archive_after;
        let txn = self.db.begin().await?;

        let orders = order::Entity::find()
            .filter(order::Column::CreatedAt.lt(cutoff))
            .filter(archivable())
            .order_by_asc(order::Column::CreatedAt)
            .lock_exclusive()
            .all(&txn)
            .await?;
        if orders.is_empty() {
            txn.commit().await?;
            return Ok(0);
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items = load_items(&txn, order_ids.clone()).await?;

        for order in &orders {
            let record_id = Uuid::new_v4();
            sales_record::ActiveModel {
                id: Set(record_id),
                original_order_id: Set(order.id),
                order_number: Set(order.order_number.clone()),
                branch_id: Set(order.branch_id),
                table_id: Set(order.table_id),
                order_type: Set(order.order_type.clone()),
                status: Set(order.status.clone()),
                payment_method: Set(order.payment_method.clone()),
                total_amount: Set(order.total_amount),
                customer_name: Set(order.customer_name.clone()),
                ordered_at: Set(order.created_at),
                archived_at: Set(now),
            }
            .insert(&txn)
            .await?;

            for item in items.remove(&order.id).unwrap_or_default() {
                sales_record_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    sales_record_id: Set(record_id),
                    product_id: Set(item.product_id),
                    product_name: Set(item.product_name),
                    quantity: Set(item.quantity),
                    unit_price: Set(item.unit_price),
                    total_price: Set(item.total_price),
                }
                .insert(&txn)
                .await?;
            }
        }

        order_item::Entity::delete_many()
            .filter(order_item::Column::OrderId.is_in(order_ids.clone()))
            .exec(&txn)
            .await?;
        let deleted = order::Entity::delete_many()
            .filter(order::Column::Id.is_in(order_ids))
            .exec(&txn)
            .await?
            .rows_affected;

        let mut table_ids: Vec<Uuid> = orders.iter().filter_map(|o| o.table_id).collect();
        table_ids.sort();
        table_ids.dedup();
        for table_id in table_ids {
            release_table_if_idle(&txn, table_id).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Archival transaction failed to commit");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send(Event::OrdersArchived { count: deleted })
            .await;
        info!(archived = deleted, %cutoff, "Archived stale orders");
        Ok(deleted)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_sales_records(
        &self,
        actor: &AuthUser,
        query: SalesRecordQuery,
    ) -> Result<Vec<SalesRecordResponse>, ServiceError> {
        let mut select =
            sales_record::Entity::find().order_by_desc(sales_record::Column::OrderedAt);

        if let Some(branch_id) = query.branch_id {
            let branch = super::load_branch_for(&*self.db, actor, branch_id).await?;
            select = select.filter(sales_record::Column::BranchId.eq(branch.id));
        } else if let Some(branch_ids) = super::visible_branch_ids(&*self.db, actor).await? {
            select = select.filter(sales_record::Column::BranchId.is_in(branch_ids));
        }
        if let Some(from) = query.from {
            select = select.filter(sales_record::Column::OrderedAt.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(sales_record::Column::OrderedAt.lt(to));
        }

        let records = select.limit(1000).all(&*self.db).await?;
        let record_ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let mut grouped: std::collections::HashMap<Uuid, Vec<sales_record_item::Model>> =
            std::collections::HashMap::new();
        if !record_ids.is_empty() {
            for item in sales_record_item::Entity::find()
                .filter(sales_record_item::Column::SalesRecordId.is_in(record_ids))
                .all(&*self.db)
                .await?
            {
                grouped.entry(item.sales_record_id).or_default().push(item);
            }
        }

        Ok(records
            .into_iter()
            .map(|record| SalesRecordResponse {
                items: grouped.remove(&record.id).unwrap_or_default(),
                record,
            })
            .collect())
    }
}
