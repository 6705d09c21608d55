use crate::{
    auth::AuthUser,
    entities::{customer, order, user_address},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Alias, Expr, Func, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, max = 50))]
    pub title: String,
    #[validate(length(min = 5, max = 500))]
    pub address_line: String,
    pub district: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub city: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CustomerQuery {
    pub search: Option<String>,
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

/// Creates the customer with this phone number or bumps the order statistics
/// of the existing one. A single `INSERT .. ON CONFLICT` so concurrent first
/// orders from the same phone land on one row.
pub(crate) async fn upsert_customer<C: ConnectionTrait>(
    db: &C,
    name: &str,
    phone: &str,
    user_id: Option<Uuid>,
) -> Result<customer::Model, ServiceError> {
    let now = Utc::now();
    let fresh = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        phone: Set(phone.to_string()),
        email: Set(None),
        user_id: Set(user_id),
        order_count: Set(1),
        last_order_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    customer::Entity::insert(fresh)
        .on_conflict(
            OnConflict::column(customer::Column::Phone)
                .value(
                    customer::Column::OrderCount,
                    Expr::col((customer::Entity, customer::Column::OrderCount)).add(1),
                )
                .value(
                    customer::Column::UserId,
                    Func::coalesce([
                        Expr::col((customer::Entity, customer::Column::UserId)).into(),
                        Expr::col((Alias::new("excluded"), customer::Column::UserId)).into(),
                    ]),
                )
                .update_columns([
                    customer::Column::Name,
                    customer::Column::LastOrderAt,
                    customer::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let model = customer::Entity::find()
        .filter(customer::Column::Phone.eq(phone))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Customer with phone {}", phone)))?;

    debug!(customer_id = %model.id, order_count = model.order_count, "Customer upserted");
    Ok(model)
}

/// Returns one of the caller's saved addresses.
pub(crate) async fn owned_address<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    address_id: Uuid,
) -> Result<user_address::Model, ServiceError> {
    user_address::Entity::find_by_id(address_id)
        .filter(user_address::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Address", address_id))
}

/// Delivery customers and saved addresses
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Customers who ordered from branches the caller can see
    #[instrument(skip(self, actor))]
    pub async fn list_customers(
        &self,
        actor: &AuthUser,
        query: CustomerQuery,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let pagination = super::Pagination::new(query.page, query.limit);
        let mut select = customer::Entity::find().order_by_desc(customer::Column::LastOrderAt);

        if let Some(branch_ids) = super::visible_branch_ids(&*self.db, actor).await? {
            let customer_ids: Vec<Uuid> = order::Entity::find()
                .select_only()
                .column(order::Column::CustomerId)
                .filter(order::Column::BranchId.is_in(branch_ids))
                .filter(order::Column::CustomerId.is_not_null())
                .distinct()
                .into_tuple::<Option<Uuid>>()
                .all(&*self.db)
                .await?
                .into_iter()
                .flatten()
                .collect();
            select = select.filter(customer::Column::Id.is_in(customer_ids));
        }

        if let Some(search) = super::non_blank(query.search) {
            select = select.filter(
                sea_orm::Condition::any()
                    .add(customer::Column::Name.contains(search.as_str()))
                    .add(customer::Column::Phone.contains(search.as_str())),
            );
        }

        let paginator = select.paginate(&*self.db, pagination.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(pagination.index()).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, actor))]
    pub async fn list_addresses(
        &self,
        actor: &AuthUser,
    ) -> Result<Vec<user_address::Model>, ServiceError> {
        Ok(user_address::Entity::find()
            .filter(user_address::Column::UserId.eq(actor.user_id))
            .order_by_desc(user_address::Column::IsDefault)
            .order_by_asc(user_address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Saves an address; the first one, or one flagged default, becomes the default
    #[instrument(skip(self, actor, input))]
    pub async fn create_address(
        &self,
        actor: &AuthUser,
        input: CreateAddressRequest,
    ) -> Result<user_address::Model, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;

        let existing = user_address::Entity::find()
            .filter(user_address::Column::UserId.eq(actor.user_id))
            .count(&txn)
            .await?;
        let is_default = existing == 0 || input.is_default;

        if is_default && existing > 0 {
            user_address::Entity::update_many()
                .col_expr(user_address::Column::IsDefault, Expr::value(false))
                .filter(user_address::Column::UserId.eq(actor.user_id))
                .exec(&txn)
                .await?;
        }

        let address = user_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor.user_id),
            title: Set(input.title.trim().to_string()),
            address_line: Set(input.address_line.trim().to_string()),
            district: Set(super::non_blank(input.district)),
            city: Set(input.city.trim().to_string()),
            notes: Set(super::non_blank(input.notes)),
            is_default: Set(is_default),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(address_id = %address.id, "Address saved");
        Ok(address)
    }

    /// Deletes an address; when it was the default the oldest remaining one takes over
    #[instrument(skip(self, actor))]
    pub async fn delete_address(&self, actor: &AuthUser, address_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let address = owned_address(&txn, actor.user_id, address_id).await?;

        user_address::Entity::delete_by_id(address.id)
            .exec(&txn)
            .await?;

        if address.is_default {
            let next = user_address::Entity::find()
                .filter(user_address::Column::UserId.eq(actor.user_id))
                .order_by_asc(user_address::Column::CreatedAt)
                .one(&txn)
                .await?;
            if let Some(next) = next {
                let mut active: user_address::ActiveModel = next.into();
                active.is_default = Set(true);
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, run_migrations};

    #[tokio::test]
    async fn repeat_phone_numbers_update_a_single_customer() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();

        let first = upsert_customer(&db, "Can", "05321112233", None).await.unwrap();
        assert_eq!(first.order_count, 1);

        let second = upsert_customer(&db, "Can Demir", "05321112233", None)
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.order_count, 2);
        assert_eq!(second.name, "Can Demir");
        assert!(second.last_order_at.is_some());

        upsert_customer(&db, "Elif", "05440001122", None).await.unwrap();
        assert_eq!(customer::Entity::find().count(&db).await.unwrap(), 2);
    }
}
