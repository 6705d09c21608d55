use crate::{
    auth::AuthUser,
    entities::{
        order::{self, OrderStatus},
        restaurant_table::{self, TableStatus},
        sales_record,
    },
    errors::ServiceError,
    services::orders::load_items,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DashboardQuery {
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub branch_id: Option<Uuid>,
    pub date: String,
    pub orders_today: u64,
    pub orders_by_status: BTreeMap<String, u64>,
    pub revenue_today: Decimal,
    pub average_order_value: Decimal,
    pub occupied_tables: u64,
    pub active_orders: u64,
    pub top_products: Vec<TopProduct>,
}

pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| Utc.from_utc_datetime(&d))
        .unwrap_or(now)
}

fn counts_as_revenue(status: &str) -> bool {
    matches!(
        OrderStatus::from_str(status),
        Ok(OrderStatus::Completed | OrderStatus::Delivered)
    )
}

/// Aggregates for the staff dashboard
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, actor))]
    pub async fn branch_dashboard(
        &self,
        actor: &AuthUser,
        branch_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, ServiceError> {
        let scope: Option<Vec<Uuid>> = match branch_id {
            Some(id) => Some(vec![super::load_branch_for(&*self.db, actor, id).await?.id]),
            None => super::visible_branch_ids(&*self.db, actor).await?,
        };
        let today = start_of_day(now);

        let mut orders_query = order::Entity::find().filter(order::Column::CreatedAt.gte(today));
        let mut active_query = order::Entity::find()
            .filter(order::Column::Status.is_in(OrderStatus::as_strs(&OrderStatus::ACTIVE)));
        let mut tables_query = restaurant_table::Entity::find()
            .filter(restaurant_table::Column::Status.eq(TableStatus::Occupied.to_string()));
        let mut archived_query = sales_record::Entity::find()
            .filter(sales_record::Column::ArchivedAt.gte(today))
            .filter(sales_record::Column::OrderedAt.gte(today));
        if let Some(ids) = scope {
            orders_query = orders_query.filter(order::Column::BranchId.is_in(ids.clone()));
            active_query = active_query.filter(order::Column::BranchId.is_in(ids.clone()));
            tables_query = tables_query.filter(restaurant_table::Column::BranchId.is_in(ids.clone()));
            archived_query = archived_query.filter(sales_record::Column::BranchId.is_in(ids));
        }

        let orders = orders_query.all(&*self.db).await?;
        let active_orders = active_query.count(&*self.db).await?;
        let occupied_tables = tables_query.count(&*self.db).await?;
        let archived = archived_query.all(&*self.db).await?;

        let mut orders_by_status: BTreeMap<String, u64> = OrderStatus::ALL
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        let mut revenue = Decimal::ZERO;
        let mut paid_orders = 0u64;
        for order in &orders {
            *orders_by_status.entry(order.status.clone()).or_default() += 1;
            if counts_as_revenue(&order.status) {
                revenue += order.total_amount;
                paid_orders += 1;
            }
        }
        for record in archived.iter().filter(|r| counts_as_revenue(&r.status)) {
            revenue += record.total_amount;
            paid_orders += 1;
        }

        let average_order_value = if paid_orders > 0 {
            (revenue / Decimal::from(paid_orders)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let sold_ids: Vec<Uuid> = orders
            .iter()
            .filter(|o| o.status() != Some(OrderStatus::Cancelled))
            .map(|o| o.id)
            .collect();
        let mut per_product: HashMap<String, (i64, Decimal)> = HashMap::new();
        for item in load_items(&*self.db, sold_ids).await?.into_values().flatten() {
            let entry = per_product
                .entry(item.product_name)
                .or_insert((0, Decimal::ZERO));
            entry.0 += i64::from(item.quantity);
            entry.1 += item.total_price;
        }
        let mut top_products: Vec<TopProduct> = per_product
            .into_iter()
            .map(|(product_name, (quantity, revenue))| TopProduct {
                product_name,
                quantity,
                revenue,
            })
            .collect();
        top_products.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        top_products.truncate(TOP_PRODUCTS);

        Ok(DashboardStats {
            branch_id,
            date: today.format("%Y-%m-%d").to_string(),
            orders_today: orders.len() as u64,
            orders_by_status,
            revenue_today: revenue.round_dp(2),
            average_order_value,
            occupied_tables,
            active_orders,
            top_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_starts_at_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 15, 42, 10).unwrap();
        assert_eq!(
            start_of_day(now),
            Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn only_finished_orders_count_as_revenue() {
        assert!(counts_as_revenue("COMPLETED"));
        assert!(counts_as_revenue("DELIVERED"));
        assert!(!counts_as_revenue("PENDING"));
        assert!(!counts_as_revenue("CANCELLED"));
    }
}
