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
use crate::entities::branch;
use crate::services::branches::{BranchMenu, CreateBranchRequest, UpdateBranchRequest};
use crate::{errors::ServiceError, handlers::common::created_response, ApiResponse, ApiResult, AppState};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BranchQuery {
    pub company_id: Option<Uuid>,
}

pub async fn list_branches(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BranchQuery>,
) -> ApiResult<Vec<branch::Model>> {
    let branches = state
        .services
        .branches
        .list_branches(&user, query.company_id)
        .await?;
    Ok(Json(ApiResponse::success(branches)))
}

pub async fn create_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let branch = state.services.branches.create_branch(&user, payload).await?;
    Ok(created_response(branch))
}

pub async fn get_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<branch::Model> {
    let branch = state.services.branches.get_branch(&user, id).await?;
    Ok(Json(ApiResponse::success(branch)))
}

pub async fn update_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBranchRequest>,
) -> ApiResult<branch::Model> {
    let branch = state
        .services
        .branches
        .update_branch(&user, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(branch)))
}

pub async fn delete_branch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.branches.delete_branch(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public menu of a branch: active categories with their available products
#[utoipa::path(
    get,
    path = "/api/v1/public/branches/{id}/menu",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Menu", body = ApiResponse<BranchMenu>),
        (status = 404, description = "Branch not found or inactive", body = crate::errors::ErrorResponse),
    ),
    tag = "menu"
)]
pub async fn branch_menu(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<BranchMenu> {
    let menu = state.services.branches.get_menu(id).await?;
    Ok(Json(ApiResponse::success(menu)))
}

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/public/branches/:id/menu", get(branch_menu));

    let read = Router::new()
        .route("/branches", get(list_branches))
        .route("/branches/:id", get(get_branch))
        .with_permission(perm::BRANCHES_READ);

    let create = Router::new()
        .route("/branches", post(create_branch))
        .with_permission(perm::BRANCHES_CREATE);

    let update = Router::new()
        .route("/branches/:id", put(update_branch))
        .with_permission(perm::BRANCHES_UPDATE);

    let remove = Router::new()
        .route("/branches/:id", delete(delete_branch))
        .with_permission(perm::BRANCHES_DELETE);

    public.merge(read).merge(create).merge(update).merge(remove)
}
