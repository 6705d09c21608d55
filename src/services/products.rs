use crate::{
    auth::AuthUser,
    cache::CacheBackend,
    entities::{category, product},
    errors::ServiceError,
    services::branches::invalidate_menu,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    pub branch_id: Uuid,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ProductFilter {
    pub branch_id: Uuid,
    pub category_id: Option<Uuid>,
    pub is_available: Option<bool>,
    pub search: Option<String>,
}

fn default_available() -> bool {
    true
}

fn ensure_price(price: Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn CacheBackend>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, cache: Arc<dyn CacheBackend>) -> Self {
        Self { db, cache }
    }

    #[instrument(skip(self, actor, input), fields(branch_id = %input.branch_id))]
    pub async fn create_product(
        &self,
        actor: &AuthUser,
        input: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        ensure_price(input.price)?;
        let branch = super::load_branch_for(&*self.db, actor, input.branch_id).await?;
        self.ensure_category_in_branch(input.category_id, branch.id)
            .await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            branch_id: Set(branch.id),
            category_id: Set(input.category_id),
            name: Set(input.name.trim().to_string()),
            description: Set(super::non_blank(input.description)),
            price: Set(input.price.round_dp(2)),
            image_url: Set(super::non_blank(input.image_url)),
            is_available: Set(input.is_available),
            sort_order: Set(input.sort_order),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        invalidate_menu(self.cache.as_ref(), branch.id).await;
        info!(product_id = %model.id, "Product created");
        Ok(model)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_products(
        &self,
        actor: &AuthUser,
        filter: ProductFilter,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let branch = super::load_branch_for(&*self.db, actor, filter.branch_id).await?;

        let mut query = product::Entity::find()
            .filter(product::Column::BranchId.eq(branch.id))
            .order_by_asc(product::Column::SortOrder)
            .order_by_asc(product::Column::Name);
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(available) = filter.is_available {
            query = query.filter(product::Column::IsAvailable.eq(available));
        }
        if let Some(search) = super::non_blank(filter.search) {
            query = query.filter(product::Column::Name.contains(search.as_str()));
        }

        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn get_product(
        &self,
        actor: &AuthUser,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        super::load_branch_for(&*self.db, actor, product.branch_id).await?;
        Ok(product)
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_product(
        &self,
        actor: &AuthUser,
        product_id: Uuid,
        input: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let product = self.get_product(actor, product_id).await?;
        let branch_id = product.branch_id;

        let mut active: product::ActiveModel = product.into();
        if let Some(category_id) = input.category_id {
            self.ensure_category_in_branch(category_id, branch_id).await?;
            active.category_id = Set(category_id);
        }
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(super::non_blank(Some(description)));
        }
        if let Some(price) = input.price {
            ensure_price(price)?;
            active.price = Set(price.round_dp(2));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(super::non_blank(Some(image_url)));
        }
        if let Some(is_available) = input.is_available {
            active.is_available = Set(is_available);
        }
        if let Some(sort_order) = input.sort_order {
            active.sort_order = Set(sort_order);
        }

        let updated = active.update(&*self.db).await?;
        invalidate_menu(self.cache.as_ref(), branch_id).await;
        Ok(updated)
    }

    #[instrument(skip(self, actor))]
    pub async fn set_availability(
        &self,
        actor: &AuthUser,
        product_id: Uuid,
        is_available: bool,
    ) -> Result<product::Model, ServiceError> {
        self.update_product(
            actor,
            product_id,
            UpdateProductRequest {
                is_available: Some(is_available),
                ..Default::default()
            },
        )
        .await
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_product(&self, actor: &AuthUser, product_id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(actor, product_id).await?;
        product::Entity::delete_by_id(product.id)
            .exec(&*self.db)
            .await?;
        invalidate_menu(self.cache.as_ref(), product.branch_id).await;
        info!(%product_id, "Product deleted");
        Ok(())
    }

    async fn ensure_category_in_branch(
        &self,
        category_id: Uuid,
        branch_id: Uuid,
    ) -> Result<(), ServiceError> {
        let category = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;
        if category.branch_id != branch_id {
            return Err(ServiceError::ValidationError(
                "Category belongs to a different branch".to_string(),
            ));
        }
        Ok(())
    }
}
