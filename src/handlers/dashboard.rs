use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::services::dashboard::{DashboardQuery, DashboardStats};
use crate::{ApiResponse, ApiResult, AppState};

/// Today's figures for one branch, or every visible branch when none is given
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard figures", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<DashboardStats> {
    let stats = state
        .services
        .dashboard
        .branch_dashboard(&user, query.branch_id, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .with_permission(perm::DASHBOARD_READ)
}
