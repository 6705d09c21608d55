use crate::{
    auth::AuthUser,
    entities::{
        branch,
        order::{self, OrderStatus, OrderType, PaymentMethod},
        order_item, product,
        restaurant_table::{self, TableStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{customers, tables::release_table_if_idle},
};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const MAX_ITEM_QUANTITY: i32 = 99;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    pub branch_id: Uuid,
    pub order_type: OrderType,
    /// Dine-in orders identify the table either by id or by its QR token
    pub table_id: Option<Uuid>,
    pub qr_code: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub customer_name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub customer_phone: Option<String>,
    #[validate(length(min = 5, max = 500))]
    pub delivery_address: Option<String>,
    /// Saved address of the signed-in customer
    pub address_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct OrderFilter {
    pub branch_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub table_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(item: order_item::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.total_price,
            notes: item.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub branch_id: Uuid,
    pub table_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub order_type: String,
    pub status: String,
    pub payment_method: Option<String>,
    pub total_amount: Decimal,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn new(order: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            branch_id: order.branch_id,
            table_id: order.table_id,
            user_id: order.user_id,
            customer_id: order.customer_id,
            order_type: order.order_type,
            status: order.status,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            delivery_address: order.delivery_address,
            notes: order.notes,
            cancel_reason: order.cancel_reason,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackedItem {
    pub product_name: String,
    pub quantity: i32,
}

/// Order view for anonymous tracking by order number; carries no personal data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderTracking {
    pub order_number: String,
    pub order_type: String,
    pub status: String,
    pub total_amount: Decimal,
    pub items: Vec<TrackedItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Human friendly order reference, e.g. `ORD-240301-7KQ2ZD`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{}", now.format("%y%m%d"), suffix)
}

/// Loads the items of several orders grouped by order id.
pub(crate) async fn load_items<C: ConnectionTrait>(
    db: &C,
    order_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<order_item::Model>>, ServiceError> {
    let mut grouped: HashMap<Uuid, Vec<order_item::Model>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::CreatedAt)
        .all(db)
        .await?;
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
}

/// Attaches items to a batch of orders, preserving order.
pub(crate) async fn with_items<C: ConnectionTrait>(
    db: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderResponse>, ServiceError> {
    let mut items = load_items(db, orders.iter().map(|o| o.id).collect()).await?;
    Ok(orders
        .into_iter()
        .map(|o| {
            let order_items = items.remove(&o.id).unwrap_or_default();
            OrderResponse::new(o, order_items)
        })
        .collect())
}

fn parse_status(order: &order::Model) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(&order.status).map_err(|_| {
        error!(order_id = %order.id, status = %order.status, "Order has unknown status");
        ServiceError::InternalError(format!("Order {} has an unknown status", order.id))
    })
}

struct ResolvedTarget {
    table: Option<restaurant_table::Model>,
    customer_id: Option<Uuid>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    delivery_address: Option<String>,
}

/// Order placement and lifecycle
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Places an order. Prices and totals come from the catalog, never the client.
    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id, order_type = %input.order_type))]
    pub async fn place_order(
        &self,
        actor: Option<&AuthUser>,
        input: PlaceOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".to_string(),
            ));
        }
        input.validate()?;
        for item in &input.items {
            if !(1..=MAX_ITEM_QUANTITY).contains(&item.quantity) {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity must be between 1 and {}",
                    MAX_ITEM_QUANTITY
                )));
            }
        }

        let txn = self.db.begin().await?;

        let branch = branch::Entity::find_by_id(input.branch_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Branch", input.branch_id))?;
        if !branch.is_active {
            return Err(ServiceError::BadRequest(
                "Branch is not accepting orders".to_string(),
            ));
        }

        let target = self.resolve_target(&txn, actor, &branch, &input).await?;

        // Catalog lookup
        let product_ids: Vec<Uuid> = input.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines = Vec::with_capacity(input.items.len());
        let mut total = Decimal::ZERO;
        for item in &input.items {
            let product = products
                .get(&item.product_id)
                .filter(|p| p.branch_id == branch.id)
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Product {} is not sold at this branch",
                        item.product_id
                    ))
                })?;
            if !product.is_available {
                return Err(ServiceError::ValidationError(format!(
                    "{} is currently unavailable",
                    product.name
                )));
            }
            let line_total = product.price * Decimal::from(item.quantity);
            total += line_total;
            lines.push((product, item, line_total));
        }

        let now = Utc::now();
        let order_number = self.unique_order_number(&txn, now).await?;
        let order_id = Uuid::new_v4();

        let order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            branch_id: Set(branch.id),
            table_id: Set(target.table.as_ref().map(|t| t.id)),
            user_id: Set(actor.map(|a| a.user_id)),
            customer_id: Set(target.customer_id),
            order_type: Set(input.order_type.to_string()),
            status: Set(OrderStatus::Pending.to_string()),
            payment_method: Set(input.payment_method.map(|m| m.to_string())),
            total_amount: Set(total.round_dp(2)),
            customer_name: Set(target.customer_name),
            customer_phone: Set(target.customer_phone),
            delivery_address: Set(target.delivery_address),
            notes: Set(super::non_blank(input.notes.clone())),
            cancel_reason: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (product, item, line_total) in lines {
            let inserted = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(Some(product.id)),
                product_name: Set(product.name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(product.price),
                total_price: Set(line_total.round_dp(2)),
                notes: Set(super::non_blank(item.notes.clone())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            items.push(inserted);
        }

        if let Some(table) = target.table {
            let opened_at = table.opened_at.unwrap_or(now);
            let mut active: restaurant_table::ActiveModel = table.into();
            active.status = Set(TableStatus::Occupied.to_string());
            active.opened_at = Set(Some(opened_at));
            active.update(&txn).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit order");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send(Event::OrderPlaced {
                order_id,
                branch_id: branch.id,
                order_number: order_number.clone(),
                total_amount: order.total_amount,
            })
            .await;

        info!(%order_id, %order_number, total = %order.total_amount, "Order placed");
        Ok(OrderResponse::new(order, items))
    }

    async fn resolve_target<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: Option<&AuthUser>,
        branch: &branch::Model,
        input: &PlaceOrderRequest,
    ) -> Result<ResolvedTarget, ServiceError> {
        let customer_name = super::non_blank(input.customer_name.clone())
            .or_else(|| actor.map(|a| a.name.clone()));
        let customer_phone = super::non_blank(input.customer_phone.clone());

        match input.order_type {
            OrderType::Table => {
                if !branch.table_ordering_enabled {
                    return Err(ServiceError::BadRequest(
                        "Table ordering is disabled for this branch".to_string(),
                    ));
                }

                let mut query = restaurant_table::Entity::find();
                query = match (input.table_id, super::non_blank(input.qr_code.clone())) {
                    (Some(table_id), _) => query.filter(restaurant_table::Column::Id.eq(table_id)),
                    (None, Some(qr)) => query.filter(restaurant_table::Column::QrCode.eq(qr)),
                    (None, None) => {
                        return Err(ServiceError::ValidationError(
                            "Table orders need a table_id or qr_code".to_string(),
                        ))
                    }
                };
                let table = query
                    .lock_exclusive()
                    .one(db)
                    .await?
                    .filter(|t| t.is_active)
                    .ok_or_else(|| ServiceError::NotFound("Table not found".to_string()))?;
                if table.branch_id != branch.id {
                    return Err(ServiceError::ValidationError(
                        "Table belongs to a different branch".to_string(),
                    ));
                }

                Ok(ResolvedTarget {
                    table: Some(table),
                    customer_id: None,
                    customer_name,
                    customer_phone,
                    delivery_address: None,
                })
            }
            OrderType::Delivery => {
                if !branch.delivery_enabled {
                    return Err(ServiceError::BadRequest(
                        "Delivery is not available for this branch".to_string(),
                    ));
                }
                let name = customer_name.ok_or_else(|| {
                    ServiceError::ValidationError("customer_name is required for delivery".into())
                })?;
                let phone = customer_phone.ok_or_else(|| {
                    ServiceError::ValidationError("customer_phone is required for delivery".into())
                })?;

                let address = match (super::non_blank(input.delivery_address.clone()), input.address_id) {
                    (Some(address), _) => address,
                    (None, Some(address_id)) => {
                        let actor = actor.ok_or_else(|| {
                            ServiceError::Unauthorized(
                                "Sign in to use a saved address".to_string(),
                            )
                        })?;
                        customers::owned_address(db, actor.user_id, address_id)
                            .await?
                            .formatted()
                    }
                    (None, None) => {
                        return Err(ServiceError::ValidationError(
                            "A delivery address is required".to_string(),
                        ))
                    }
                };

                let customer =
                    customers::upsert_customer(db, &name, &phone, actor.map(|a| a.user_id))
                        .await?;

                Ok(ResolvedTarget {
                    table: None,
                    customer_id: Some(customer.id),
                    customer_name: Some(name),
                    customer_phone: Some(phone),
                    delivery_address: Some(address),
                })
            }
            OrderType::Takeaway => Ok(ResolvedTarget {
                table: None,
                customer_id: None,
                customer_name,
                customer_phone,
                delivery_address: None,
            }),
        }
    }

    async fn unique_order_number<C: ConnectionTrait>(
        &self,
        db: &C,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        for _ in 0..5 {
            let candidate = generate_order_number(now);
            let taken = order::Entity::find()
                .filter(order::Column::OrderNumber.eq(candidate.as_str()))
                .count(db)
                .await?
                > 0;
            if !taken {
                return Ok(candidate);
            }
            warn!(%candidate, "Order number collision, retrying");
        }
        Err(ServiceError::InternalError(
            "Could not allocate an order number".to_string(),
        ))
    }

    #[instrument(skip(self, actor))]
    pub async fn get_order(&self, actor: &AuthUser, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = self.load_for(&*self.db, actor, order_id).await?;
        let mut responses = with_items(&*self.db, vec![order]).await?;
        responses
            .pop()
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Anonymous order tracking
    #[instrument(skip(self))]
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<OrderTracking, ServiceError> {
        let order = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number.trim().to_uppercase()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_number))?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(OrderTracking {
            order_number: order.order_number,
            order_type: order.order_type,
            status: order.status,
            total_amount: order.total_amount,
            items: items
                .into_iter()
                .map(|i| TrackedItem {
                    product_name: i.product_name,
                    quantity: i.quantity,
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }

    #[instrument(skip(self, actor))]
    pub async fn list_orders(
        &self,
        actor: &AuthUser,
        filter: OrderFilter,
    ) -> Result<(Vec<OrderResponse>, u64), ServiceError> {
        let pagination = super::Pagination::new(filter.page, filter.limit);
        let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);

        if let Some(branch_ids) = super::visible_branch_ids(&*self.db, actor).await? {
            query = query.filter(order::Column::BranchId.is_in(branch_ids));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(order::Column::BranchId.eq(branch_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status.to_string()));
        }
        if let Some(order_type) = filter.order_type {
            query = query.filter(order::Column::OrderType.eq(order_type.to_string()));
        }
        if let Some(table_id) = filter.table_id {
            query = query.filter(order::Column::TableId.eq(table_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(order::Column::CreatedAt.lt(to));
        }

        let paginator = query.paginate(&*self.db, pagination.limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(pagination.index()).await?;
        Ok((with_items(&*self.db, orders).await?, total))
    }

    /// Orders placed by the signed-in customer, newest first
    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn list_my_orders(&self, actor: &AuthUser) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(actor.user_id))
            .order_by_desc(order::Column::CreatedAt)
            .limit(100)
            .all(&*self.db)
            .await?;
        with_items(&*self.db, orders).await
    }

    #[instrument(skip(self, actor))]
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        order_id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        self.transition(actor, order_id, next, None).await
    }

    #[instrument(skip(self, actor))]
    pub async fn cancel_order(
        &self,
        actor: &AuthUser,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        self.transition(actor, order_id, OrderStatus::Cancelled, super::non_blank(reason))
            .await
    }

    async fn transition(
        &self,
        actor: &AuthUser,
        order_id: Uuid,
        next: OrderStatus,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_for(&txn, actor, order_id).await?;
        let current = parse_status(&order)?;

        if current.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Order is already {}",
                current
            )));
        }
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot change order status from {} to {}",
                current, next
            )));
        }

        let table_id = order.table_id;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(next.to_string());
        if next == OrderStatus::Cancelled {
            active.cancel_reason = Set(reason.clone());
        }
        let updated = active.update(&txn).await?;

        if next.is_terminal() {
            if let Some(table_id) = table_id {
                release_table_if_idle(&txn, table_id).await?;
            }
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status: current,
                new_status: next,
            })
            .await;
        if next == OrderStatus::Cancelled {
            self.event_sender
                .send(Event::OrderCancelled { order_id, reason })
                .await;
        }

        info!(%order_id, from = %current, to = %next, "Order status changed");
        let mut responses = with_items(&*self.db, vec![updated]).await?;
        responses
            .pop()
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Removes an order and its items
    #[instrument(skip(self, actor))]
    pub async fn delete_order(&self, actor: &AuthUser, order_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_for(&txn, actor, order_id).await?;

        order_item::Entity::delete_many()
            .filter(order_item::Column::OrderId.eq(order.id))
            .exec(&txn)
            .await?;
        order::Entity::delete_by_id(order.id).exec(&txn).await?;

        if let Some(table_id) = order.table_id {
            release_table_if_idle(&txn, table_id).await?;
        }

        txn.commit().await?;
        info!(%order_id, "Order deleted");
        Ok(())
    }

    async fn load_for<C: ConnectionTrait>(
        &self,
        db: &C,
        actor: &AuthUser,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .lock_exclusive()
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        if order.user_id == Some(actor.user_id) && !actor.role.is_staff() {
            return Ok(order);
        }
        super::load_branch_for(db, actor, order.branch_id).await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_numbers_embed_the_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("ORD-240301-"));
        assert_eq!(number.len(), "ORD-240301-".len() + 6);
        assert!(number[11..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn empty_orders_fail_validation() {
        let request = PlaceOrderRequest {
            branch_id: Uuid::new_v4(),
            order_type: OrderType::Takeaway,
            table_id: None,
            qr_code: None,
            customer_name: None,
            customer_phone: None,
            delivery_address: None,
            address_id: None,
            payment_method: None,
            notes: None,
            items: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn item_list_length_is_bounded() {
        let item = OrderItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
            notes: None,
        };
        let mut request = PlaceOrderRequest {
            branch_id: Uuid::new_v4(),
            order_type: OrderType::Takeaway,
            table_id: None,
            qr_code: None,
            customer_name: Some("Zeynep".to_string()),
            customer_phone: None,
            delivery_address: None,
            address_id: None,
            payment_method: None,
            notes: None,
            items: vec![item.clone(); 50],
        };
        assert!(request.validate().is_ok());

        request.items.push(item);
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
    }
}
