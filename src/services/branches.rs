use crate::{
    auth::{AuthUser, Role},
    cache::{get_json, set_json, CacheBackend},
    entities::{branch, category, company, order, order::OrderStatus, product},
    errors::ServiceError,
    metrics::BUSINESS_METRICS,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBranchRequest {
    /// Required for super admins; company admins always create in their own company
    pub company_id: Option<Uuid>,
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    #[validate(length(min = 5, max = 500))]
    pub address: String,
    pub phone: Option<String>,
    pub opening_hours: Option<String>,
    #[serde(default = "default_true")]
    pub delivery_enabled: bool,
    #[serde(default = "default_true")]
    pub table_ordering_enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBranchRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 5, max = 500))]
    pub address: Option<String>,
    pub phone: Option<String>,
    pub opening_hours: Option<String>,
    pub delivery_enabled: Option<bool>,
    pub table_ordering_enabled: Option<bool>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuProduct {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub products: Vec<MenuProduct>,
}

/// Public menu of a branch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BranchMenu {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub currency: String,
    pub delivery_enabled: bool,
    pub table_ordering_enabled: bool,
    pub categories: Vec<MenuCategory>,
}

pub fn menu_cache_key(branch_id: Uuid) -> String {
    format!("menu:{}", branch_id)
}

/// Drops the cached menu of a branch; failures only cost a stale read until TTL.
pub async fn invalidate_menu(cache: &dyn CacheBackend, branch_id: Uuid) {
    if let Err(e) = cache.delete(&menu_cache_key(branch_id)).await {
        warn!(%branch_id, error = %e, "Failed to invalidate menu cache");
    }
}

/// Branch management and public menus
#[derive(Clone)]
pub struct BranchService {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn CacheBackend>,
    menu_ttl: Duration,
    currency: String,
}

impl BranchService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn CacheBackend>,
        menu_ttl: Duration,
        currency: String,
    ) -> Self {
        Self {
            db,
            cache,
            menu_ttl,
            currency,
        }
    }

    #[instrument(skip(self, actor, input), fields(name = %input.name))]
    pub async fn create_branch(
        &self,
        actor: &AuthUser,
        input: CreateBranchRequest,
    ) -> Result<branch::Model, ServiceError> {
        input.validate()?;

        let company_id = match (actor.role, input.company_id) {
            (Role::SuperAdmin, Some(id)) => id,
            (Role::SuperAdmin, None) => {
                return Err(ServiceError::ValidationError(
                    "company_id is required".to_string(),
                ))
            }
            (_, requested) => {
                let own = actor.company_id.ok_or_else(|| {
                    ServiceError::Forbidden("You are not assigned to a company".to_string())
                })?;
                if requested.map_or(false, |id| id != own) {
                    return Err(ServiceError::Forbidden(
                        "Cannot create branches for another company".to_string(),
                    ));
                }
                own
            }
        };

        if !actor.can_access_company(company_id) || actor.role == Role::BranchManager {
            return Err(ServiceError::Forbidden(
                "You cannot create branches for this company".to_string(),
            ));
        }

        company::Entity::find_by_id(company_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Company", company_id))?;

        let model = branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            name: Set(input.name.trim().to_string()),
            address: Set(input.address.trim().to_string()),
            phone: Set(super::non_blank(input.phone)),
            opening_hours: Set(super::non_blank(input.opening_hours)),
            delivery_enabled: Set(input.delivery_enabled),
            table_ordering_enabled: Set(input.table_ordering_enabled),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(branch_id = %model.id, %company_id, "Branch created");
        Ok(model)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_branches(
        &self,
        actor: &AuthUser,
        company_id: Option<Uuid>,
    ) -> Result<Vec<branch::Model>, ServiceError> {
        let mut query = branch::Entity::find().order_by_asc(branch::Column::Name);

        match actor.role {
            Role::SuperAdmin => {
                if let Some(company_id) = company_id {
                    query = query.filter(branch::Column::CompanyId.eq(company_id));
                }
            }
            Role::CompanyAdmin => match actor.company_id {
                Some(own) => query = query.filter(branch::Column::CompanyId.eq(own)),
                None => return Ok(vec![]),
            },
            Role::BranchManager => match actor.branch_id {
                Some(own) => query = query.filter(branch::Column::Id.eq(own)),
                None => return Ok(vec![]),
            },
            Role::Customer => return Ok(vec![]),
        }

        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn get_branch(
        &self,
        actor: &AuthUser,
        branch_id: Uuid,
    ) -> Result<branch::Model, ServiceError> {
        super::load_branch_for(&*self.db, actor, branch_id).await
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_branch(
        &self,
        actor: &AuthUser,
        branch_id: Uuid,
        input: UpdateBranchRequest,
    ) -> Result<branch::Model, ServiceError> {
        input.validate()?;
        let branch = super::load_branch_for(&*self.db, actor, branch_id).await?;

        let mut active: branch::ActiveModel = branch.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = input.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(phone) = input.phone {
            active.phone = Set(super::non_blank(Some(phone)));
        }
        if let Some(hours) = input.opening_hours {
            active.opening_hours = Set(super::non_blank(Some(hours)));
        }
        if let Some(delivery) = input.delivery_enabled {
            active.delivery_enabled = Set(delivery);
        }
        if let Some(tables) = input.table_ordering_enabled {
            active.table_ordering_enabled = Set(tables);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(&*self.db).await?;
        invalidate_menu(self.cache.as_ref(), branch_id).await;
        info!(%branch_id, "Branch updated");
        Ok(updated)
    }

    /// Deletes a branch with its catalog, tables and order history
    #[instrument(skip(self, actor))]
    pub async fn delete_branch(&self, actor: &AuthUser, branch_id: Uuid) -> Result<(), ServiceError> {
        if actor.role == Role::BranchManager {
            return Err(ServiceError::Forbidden(
                "Branch managers cannot delete branches".to_string(),
            ));
        }
        let branch = super::load_branch_for(&*self.db, actor, branch_id).await?;

        let active_orders = order::Entity::find()
            .filter(order::Column::BranchId.eq(branch.id))
            .filter(order::Column::Status.is_in(OrderStatus::as_strs(&OrderStatus::ACTIVE)))
            .count(&*self.db)
            .await?;
        if active_orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Branch has {} active order(s)",
                active_orders
            )));
        }

        branch::Entity::delete_by_id(branch.id)
            .exec(&*self.db)
            .await?;
        invalidate_menu(self.cache.as_ref(), branch_id).await;
        info!(%branch_id, "Branch deleted");
        Ok(())
    }

    /// Public menu: active categories with their available products
    #[instrument(skip(self))]
    pub async fn get_menu(&self, branch_id: Uuid) -> Result<BranchMenu, ServiceError> {
        let key = menu_cache_key(branch_id);
        match get_json::<BranchMenu>(self.cache.as_ref(), &key).await {
            Ok(Some(menu)) => {
                BUSINESS_METRICS.record_menu_cache(true);
                return Ok(menu);
            }
            Ok(None) => BUSINESS_METRICS.record_menu_cache(false),
            Err(e) => warn!(%branch_id, error = %e, "Menu cache read failed"),
        }

        let branch = branch::Entity::find_by_id(branch_id)
            .filter(branch::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Branch", branch_id))?;

        let menu = self.build_menu(&branch).await?;
        if let Err(e) = set_json(self.cache.as_ref(), &key, &menu, Some(self.menu_ttl)).await {
            warn!(%branch_id, error = %e, "Menu cache write failed");
        }
        Ok(menu)
    }

    async fn build_menu(&self, branch: &branch::Model) -> Result<BranchMenu, ServiceError> {
        let categories = category::Entity::find()
            .filter(category::Column::BranchId.eq(branch.id))
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        let products = product::Entity::find()
            .filter(product::Column::BranchId.eq(branch.id))
            .filter(product::Column::IsAvailable.eq(true))
            .order_by_asc(product::Column::SortOrder)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        let categories = categories
            .into_iter()
            .map(|c| MenuCategory {
                products: products
                    .iter()
                    .filter(|p| p.category_id == c.id)
                    .map(|p| MenuProduct {
                        id: p.id,
                        name: p.name.clone(),
                        description: p.description.clone(),
                        price: p.price,
                        image_url: p.image_url.clone(),
                        sort_order: p.sort_order,
                    })
                    .collect(),
                id: c.id,
                name: c.name,
                description: c.description,
                sort_order: c.sort_order,
            })
            .collect();

        Ok(BranchMenu {
            branch_id: branch.id,
            branch_name: branch.name.clone(),
            currency: self.currency.clone(),
            delivery_enabled: branch.delivery_enabled,
            table_ordering_enabled: branch.table_ordering_enabled,
            categories,
        })
    }
}
