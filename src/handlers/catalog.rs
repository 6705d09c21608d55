//! Menu management: categories and products of a branch.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::entities::{category, product};
use crate::services::categories::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::services::products::{
    AvailabilityRequest, CreateProductRequest, ProductFilter, UpdateProductRequest,
};
use crate::{errors::ServiceError, handlers::common::created_response, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryQuery {
    pub branch_id: Uuid,
}

pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<category::Model>> {
    let categories = state
        .services
        .categories
        .list_categories(&user, query.branch_id)
        .await?;
    Ok(Json(ApiResponse::success(categories)))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state
        .services
        .categories
        .create_category(&user, payload)
        .await?;
    Ok(created_response(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<category::Model> {
    let category = state
        .services
        .categories
        .update_category(&user, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.categories.delete_category(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<Vec<product::Model>> {
    let products = state.services.products.list_products(&user, filter).await?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create_product(&user, payload).await?;
    Ok(created_response(product))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<product::Model> {
    let product = state.services.products.get_product(&user, id).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> ApiResult<product::Model> {
    let product = state
        .services
        .products
        .update_product(&user, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Toggles whether a product can be ordered without touching the rest of it
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityRequest>,
) -> ApiResult<product::Model> {
    let product = state
        .services
        .products
        .set_availability(&user, id, payload.is_available)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_product(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    let categories_read = Router::new()
        .route("/categories", get(list_categories))
        .with_permission(perm::CATEGORIES_READ);

    let categories_create = Router::new()
        .route("/categories", post(create_category))
        .with_permission(perm::CATEGORIES_CREATE);

    let categories_update = Router::new()
        .route("/categories/:id", put(update_category))
        .with_permission(perm::CATEGORIES_UPDATE);

    let categories_delete = Router::new()
        .route("/categories/:id", delete(delete_category))
        .with_permission(perm::CATEGORIES_DELETE);

    let products_read = Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .with_permission(perm::PRODUCTS_READ);

    let products_create = Router::new()
        .route("/products", post(create_product))
        .with_permission(perm::PRODUCTS_CREATE);

    let products_update = Router::new()
        .route("/products/:id", put(update_product))
        .route("/products/:id/availability", put(set_availability))
        .with_permission(perm::PRODUCTS_UPDATE);

    let products_delete = Router::new()
        .route("/products/:id", delete(delete_product))
        .with_permission(perm::PRODUCTS_DELETE);

    categories_read
        .merge(categories_create)
        .merge(categories_update)
        .merge(categories_delete)
        .merge(products_read)
        .merge(products_create)
        .merge(products_update)
        .merge(products_delete)
}
