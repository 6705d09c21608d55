use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::services::archival::{SalesRecordQuery, SalesRecordResponse};
use crate::{ApiResponse, ApiResult, AppState};

/// Archived sales of the caller's branches, newest first
pub async fn list_sales_records(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalesRecordQuery>,
) -> ApiResult<Vec<SalesRecordResponse>> {
    let records = state
        .services
        .archival
        .list_sales_records(&user, query)
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales-records", get(list_sales_records))
        .with_permission(perm::REPORTS_READ)
}
