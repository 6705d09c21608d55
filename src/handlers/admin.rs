use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::auth::{AuthRouterExt, Role};
use crate::backup::BackupReport;
use crate::services::admin::{ArchivalReport, DatabaseStatus, SeedReport};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn db_status(State(state): State<AppState>) -> ApiResult<DatabaseStatus> {
    let status = state.services.admin.database_status().await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn seed_demo_data(State(state): State<AppState>) -> ApiResult<SeedReport> {
    let report = state.services.admin.seed_demo_data().await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn run_archival(State(state): State<AppState>) -> ApiResult<ArchivalReport> {
    let report = state.services.admin.run_archival_now().await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn run_backup(State(state): State<AppState>) -> ApiResult<BackupReport> {
    let report = state.services.admin.run_backup_now().await?;
    Ok(Json(ApiResponse::success(report)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/db-status", get(db_status))
        .route("/admin/seed", post(seed_demo_data))
        .route("/admin/archive/run", post(run_archival))
        .route("/admin/backup/run", post(run_backup))
        .with_role(Role::SuperAdmin)
}
