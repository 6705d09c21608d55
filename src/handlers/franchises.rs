use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::entities::franchise_application;
use crate::services::franchises::{
    ApplicationQuery, FranchiseApplicationRequest, ReviewApplicationRequest,
};
use crate::{errors::ServiceError, handlers::common::created_response, ApiResponse, ApiResult, AppState};

pub async fn submit_application(
    State(state): State<AppState>,
    Json(payload): Json<FranchiseApplicationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let application = state
        .services
        .franchises
        .submit_application(payload)
        .await?;
    Ok(created_response(application))
}

pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationQuery>,
) -> ApiResult<Vec<franchise_application::Model>> {
    let applications = state
        .services
        .franchises
        .list_applications(&user, query)
        .await?;
    Ok(Json(ApiResponse::success(applications)))
}

pub async fn review_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewApplicationRequest>,
) -> ApiResult<franchise_application::Model> {
    let application = state
        .services
        .franchises
        .update_status(&user, id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(application)))
}

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/public/franchise-applications", post(submit_application));

    let read = Router::new()
        .route("/franchise-applications", get(list_applications))
        .with_permission(perm::FRANCHISES_READ);

    let update = Router::new()
        .route("/franchise-applications/:id/status", put(review_application))
        .with_permission(perm::FRANCHISES_UPDATE);

    public.merge(read).merge(update)
}
