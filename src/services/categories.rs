use crate::{
    auth::AuthUser,
    cache::CacheBackend,
    entities::{category, product},
    errors::ServiceError,
    services::branches::invalidate_menu,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    pub branch_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn CacheBackend>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, cache: Arc<dyn CacheBackend>) -> Self {
        Self { db, cache }
    }

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_category(
        &self,
        actor: &AuthUser,
        input: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let branch = super::load_branch_for(&*self.db, actor, input.branch_id).await?;

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(branch.id),
            name: Set(input.name.trim().to_string()),
            description: Set(super::non_blank(input.description)),
            sort_order: Set(input.sort_order),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        invalidate_menu(self.cache.as_ref(), branch.id).await;
        info!(category_id = %model.id, "Category created");
        Ok(model)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_categories(
        &self,
        actor: &AuthUser,
        branch_id: Uuid,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let branch = super::load_branch_for(&*self.db, actor, branch_id).await?;
        Ok(category::Entity::find()
            .filter(category::Column::BranchId.eq(branch.id))
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_category(
        &self,
        actor: &AuthUser,
        category_id: Uuid,
        input: UpdateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let category = self.load(actor, category_id).await?;
        let branch_id = category.branch_id;

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(super::non_blank(Some(description)));
        }
        if let Some(sort_order) = input.sort_order {
            active.sort_order = Set(sort_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active.update(&*self.db).await?;
        invalidate_menu(self.cache.as_ref(), branch_id).await;
        Ok(updated)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_category(
        &self,
        actor: &AuthUser,
        category_id: Uuid,
    ) -> Result<(), ServiceError> {
        let category = self.load(actor, category_id).await?;

        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category.id))
            .count(&*self.db)
            .await?;
        if product_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category still has {} product(s)",
                product_count
            )));
        }

        category::Entity::delete_by_id(category.id)
            .exec(&*self.db)
            .await?;
        invalidate_menu(self.cache.as_ref(), category.branch_id).await;
        info!(%category_id, "Category deleted");
        Ok(())
    }

    async fn load(&self, actor: &AuthUser, category_id: Uuid) -> Result<category::Model, ServiceError> {
        let category = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;
        super::load_branch_for(&*self.db, actor, category.branch_id).await?;
        Ok(category)
    }
}
