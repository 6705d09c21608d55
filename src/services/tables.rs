use crate::{
    auth::AuthUser,
    entities::{
        branch,
        order::{self, OrderStatus, PaymentMethod},
        restaurant_table::{self, TableStatus},
        table_payment,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        branches::{BranchMenu, BranchService},
        orders::{with_items, OrderResponse},
    },
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const QR_CODE_LEN: usize = 16;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTableRequest {
    pub branch_id: Uuid,
    #[validate(range(min = 1, max = 9999))]
    pub table_number: i32,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_capacity")]
    pub capacity: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTableRequest {
    #[validate(range(min = 1, max = 9999))]
    pub table_number: Option<i32>,
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CollectTableRequest {
    pub payment_method: PaymentMethod,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaymentQuery {
    pub branch_id: Option<Uuid>,
    pub table_id: Option<Uuid>,
}

fn default_capacity() -> i32 {
    4
}

/// Table, its branch and the menu, as seen by a guest scanning the QR code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QrResolution {
    pub table_id: Uuid,
    pub table_number: i32,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub menu: BranchMenu,
}

/// Open bill of a table
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableSummary {
    pub table_id: Uuid,
    pub table_number: i32,
    pub status: String,
    pub opened_at: Option<chrono::DateTime<chrono::Utc>>,
    pub open_orders: Vec<OrderResponse>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub table_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub order_count: i32,
    pub order_ids: Vec<Uuid>,
    pub collected_by: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<table_payment::Model> for PaymentResponse {
    fn from(payment: table_payment::Model) -> Self {
        Self {
            order_ids: payment.settled_order_ids(),
            id: payment.id,
            branch_id: payment.branch_id,
            table_id: payment.table_id,
            amount: payment.amount,
            payment_method: payment.payment_method,
            order_count: payment.order_count,
            collected_by: payment.collected_by,
            note: payment.note,
            created_at: payment.created_at,
        }
    }
}

pub fn generate_qr_code() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(QR_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Frees a table once none of its orders is open any more.
pub(crate) async fn release_table_if_idle<C: ConnectionTrait>(
    db: &C,
    table_id: Uuid,
) -> Result<bool, ServiceError> {
    let open = order::Entity::find()
        .filter(order::Column::TableId.eq(table_id))
        .filter(order::Column::Status.is_in(OrderStatus::as_strs(&OrderStatus::OPEN)))
        .count(db)
        .await?;
    if open > 0 {
        return Ok(false);
    }

    let Some(table) = restaurant_table::Entity::find_by_id(table_id).one(db).await? else {
        return Ok(false);
    };
    if !table.is_occupied() {
        return Ok(false);
    }

    let mut active: restaurant_table::ActiveModel = table.into();
    active.status = Set(TableStatus::Available.to_string());
    active.opened_at = Set(None);
    active.update(db).await?;
    debug!(%table_id, "Table released");
    Ok(true)
}

/// Dine-in tables, QR resolution and bill collection
#[derive(Clone)]
pub struct TableService {
    db: Arc<DatabaseConnection>,
    branches: Arc<BranchService>,
    event_sender: Arc<EventSender>,
}

impl TableService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        branches: Arc<BranchService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            branches,
            event_sender,
        }
    }

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id, table_number = input.table_number))]
    pub async fn create_table(
        &self,
        actor: &AuthUser,
        input: CreateTableRequest,
    ) -> Result<restaurant_table::Model, ServiceError> {
        input.validate()?;
        let branch = super::load_branch_for(&*self.db, actor, input.branch_id).await?;
        self.ensure_number_free(branch.id, input.table_number, None)
            .await?;

        let table = restaurant_table::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(branch.id),
            table_number: Set(input.table_number),
            qr_code: Set(generate_qr_code()),
            capacity: Set(input.capacity),
            status: Set(TableStatus::Available.to_string()),
            is_active: Set(true),
            opened_at: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(table_id = %table.id, "Table created");
        Ok(table)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_tables(
        &self,
        actor: &AuthUser,
        branch_id: Uuid,
    ) -> Result<Vec<restaurant_table::Model>, ServiceError> {
        let branch = super::load_branch_for(&*self.db, actor, branch_id).await?;
        Ok(restaurant_table::Entity::find()
            .filter(restaurant_table::Column::BranchId.eq(branch.id))
            .order_by_asc(restaurant_table::Column::TableNumber)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn get_table(
        &self,
        actor: &AuthUser,
        table_id: Uuid,
    ) -> Result<restaurant_table::Model, ServiceError> {
        self.load_for(&*self.db, actor, table_id).await
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_table(
        &self,
        actor: &AuthUser,
        table_id: Uuid,
        input: UpdateTableRequest,
    ) -> Result<restaurant_table::Model, ServiceError> {
        input.validate()?;
        let table = self.load_for(&*self.db, actor, table_id).await?;

        if let Some(number) = input.table_number {
            if number != table.table_number {
                self.ensure_number_free(table.branch_id, number, Some(table.id))
                    .await?;
            }
        }

        let mut active: restaurant_table::ActiveModel = table.into();
        if let Some(number) = input.table_number {
            active.table_number = Set(number);
        }
        if let Some(capacity) = input.capacity {
            active.capacity = Set(capacity);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_table(&self, actor: &AuthUser, table_id: Uuid) -> Result<(), ServiceError> {
        let table = self.load_for(&*self.db, actor, table_id).await?;

        let referencing = order::Entity::find()
            .filter(order::Column::TableId.eq(table.id))
            .count(&*self.db)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Table has {} order(s); deactivate it instead",
                referencing
            )));
        }

        restaurant_table::Entity::delete_by_id(table.id)
            .exec(&*self.db)
            .await?;
        info!(%table_id, "Table deleted");
        Ok(())
    }

    /// Issues a new QR token, invalidating printed codes
    #[instrument(skip(self, actor))]
    pub async fn regenerate_qr_code(
        &self,
        actor: &AuthUser,
        table_id: Uuid,
    ) -> Result<restaurant_table::Model, ServiceError> {
        let table = self.load_for(&*self.db, actor, table_id).await?;
        let mut active: restaurant_table::ActiveModel = table.into();
        active.qr_code = Set(generate_qr_code());
        let updated = active.update(&*self.db).await?;
        info!(%table_id, "QR code regenerated");
        Ok(updated)
    }

    /// Public entry point behind a table's QR code
    #[instrument(skip(self, qr_code))]
    pub async fn resolve_qr(&self, qr_code: &str) -> Result<QrResolution, ServiceError> {
        let table = restaurant_table::Entity::find()
            .filter(restaurant_table::Column::QrCode.eq(qr_code.trim()))
            .filter(restaurant_table::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Table not found".to_string()))?;

        let branch = branch::Entity::find_by_id(table.branch_id)
            .filter(branch::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Branch", table.branch_id))?;
        if !branch.table_ordering_enabled {
            return Err(ServiceError::BadRequest(
                "Table ordering is disabled for this branch".to_string(),
            ));
        }

        let menu = self.branches.get_menu(branch.id).await?;
        Ok(QrResolution {
            table_id: table.id,
            table_number: table.table_number,
            branch_id: branch.id,
            branch_name: branch.name,
            menu,
        })
    }

    #[instrument(skip(self, actor))]
    pub async fn table_summary(
        &self,
        actor: &AuthUser,
        table_id: Uuid,
    ) -> Result<TableSummary, ServiceError> {
        let table = self.load_for(&*self.db, actor, table_id).await?;
        let open_orders = order::Entity::find()
            .filter(order::Column::TableId.eq(table.id))
            .filter(order::Column::Status.is_in(OrderStatus::as_strs(&OrderStatus::OPEN)))
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let total_amount = open_orders
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc + o.total_amount);

        Ok(TableSummary {
            table_id: table.id,
            table_number: table.table_number,
            status: table.status,
            opened_at: table.opened_at,
            open_orders: with_items(&*self.db, open_orders).await?,
            total_amount,
        })
    }

    /// Settles every open order of a table in one payment and frees the table.
    ///
    /// The table row is locked for the whole transaction so two cashiers
    /// collecting the same table cannot both succeed; the loser sees a conflict.
    #[instrument(skip(self, actor, input), fields(user_id = %actor.user_id))]
    pub async fn collect_table(
        &self,
        actor: &AuthUser,
        table_id: Uuid,
        input: CollectTableRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;

        let table = restaurant_table::Entity::find_by_id(table_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Table", table_id))?;
        super::load_branch_for(&txn, actor, table.branch_id).await?;

        let open_orders = order::Entity::find()
            .filter(order::Column::TableId.eq(table.id))
            .filter(order::Column::Status.is_in(OrderStatus::as_strs(&OrderStatus::OPEN)))
            .lock_exclusive()
            .all(&txn)
            .await?;
        if open_orders.is_empty() {
            return Err(ServiceError::Conflict(
                "Table has no open orders to collect".to_string(),
            ));
        }

        let order_ids: Vec<Uuid> = open_orders.iter().map(|o| o.id).collect();
        let amount = open_orders
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc + o.total_amount)
            .round_dp(2);

        let result = order::Entity::update_many()
            .col_expr(
                order::Column::Status,
                Expr::value(OrderStatus::Completed.to_string()),
            )
            .col_expr(
                order::Column::PaymentMethod,
                Expr::value(input.payment_method.to_string()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(order::Column::Id.is_in(order_ids.clone()))
            .filter(order::Column::Status.is_in(OrderStatus::as_strs(&OrderStatus::OPEN)))
            .exec(&txn)
            .await?;
        if result.rows_affected != order_ids.len() as u64 {
            warn!(
                expected = order_ids.len(),
                updated = result.rows_affected,
                "Orders changed while collecting table"
            );
            return Err(ServiceError::Conflict(
                "Table orders changed during collection, please retry".to_string(),
            ));
        }

        let order_ids_json = serde_json::to_string(&order_ids)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let payment = table_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(table.branch_id),
            table_id: Set(table.id),
            amount: Set(amount),
            payment_method: Set(input.payment_method.to_string()),
            order_count: Set(order_ids.len() as i32),
            order_ids: Set(order_ids_json),
            collected_by: Set(Some(actor.user_id)),
            note: Set(super::non_blank(input.note)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut active: restaurant_table::ActiveModel = table.into();
        active.status = Set(TableStatus::Available.to_string());
        active.opened_at = Set(None);
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::TableCollected {
                table_id,
                payment_id: payment.id,
                amount,
                order_count: order_ids.len(),
            })
            .await;

        info!(%table_id, payment_id = %payment.id, %amount, orders = order_ids.len(), "Table collected");
        Ok(payment.into())
    }

    /// Payment history of one table or of a whole branch
    #[instrument(skip(self, actor))]
    pub async fn list_payments(
        &self,
        actor: &AuthUser,
        query: PaymentQuery,
    ) -> Result<Vec<PaymentResponse>, ServiceError> {
        let mut select =
            table_payment::Entity::find().order_by_desc(table_payment::Column::CreatedAt);

        match (query.table_id, query.branch_id) {
            (Some(table_id), _) => {
                let table = self.load_for(&*self.db, actor, table_id).await?;
                select = select.filter(table_payment::Column::TableId.eq(table.id));
            }
            (None, Some(branch_id)) => {
                let branch = super::load_branch_for(&*self.db, actor, branch_id).await?;
                select = select.filter(table_payment::Column::BranchId.eq(branch.id));
            }
            (None, None) => {
                return Err(ServiceError::ValidationError(
                    "branch_id or table_id is required".to_string(),
                ))
            }
        }

        Ok(select
            .limit(500)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(PaymentResponse::from)
            .collect())
    }

    async fn load_for<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &AuthUser,
        table_id: Uuid,
    ) -> Result<restaurant_table::Model, ServiceError> {
        let table = restaurant_table::Entity::find_by_id(table_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Table", table_id))?;
        super::load_branch_for(db, actor, table.branch_id).await?;
        Ok(table)
    }

    async fn ensure_number_free(
        &self,
        branch_id: Uuid,
        table_number: i32,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = restaurant_table::Entity::find()
            .filter(restaurant_table::Column::BranchId.eq(branch_id))
            .filter(restaurant_table::Column::TableNumber.eq(table_number));
        if let Some(id) = except {
            query = query.filter(restaurant_table::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Table {} already exists in this branch",
                table_number
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_codes_are_alphanumeric_and_distinct() {
        let a = generate_qr_code();
        let b = generate_qr_code();
        assert_eq!(a.len(), QR_CODE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn payment_response_expands_order_ids() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let model = table_payment::Model {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            table_id: Uuid::new_v4(),
            amount: Decimal::new(4550, 2),
            payment_method: "CASH".into(),
            order_count: 2,
            order_ids: serde_json::to_string(&ids).unwrap(),
            collected_by: None,
            note: None,
            created_at: chrono::Utc::now(),
        };
        let response = PaymentResponse::from(model);
        assert_eq!(response.order_ids, ids);
    }
}
