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
use crate::entities::restaurant_table;
use crate::services::tables::{
    CollectTableRequest, CreateTableRequest, PaymentQuery, PaymentResponse, QrResolution,
    TableSummary, UpdateTableRequest,
};
use crate::{errors::ServiceError, handlers::common::created_response, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct TableQuery {
    pub branch_id: Uuid,
}

pub async fn list_tables(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TableQuery>,
) -> ApiResult<Vec<restaurant_table::Model>> {
    let tables = state
        .services
        .tables
        .list_tables(&user, query.branch_id)
        .await?;
    Ok(Json(ApiResponse::success(tables)))
}

pub async fn create_table(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTableRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let table = state.services.tables.create_table(&user, payload).await?;
    Ok(created_response(table))
}

pub async fn get_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<restaurant_table::Model> {
    let table = state.services.tables.get_table(&user, id).await?;
    Ok(Json(ApiResponse::success(table)))
}

pub async fn update_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTableRequest>,
) -> ApiResult<restaurant_table::Model> {
    let table = state
        .services
        .tables
        .update_table(&user, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(table)))
}

pub async fn delete_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.tables.delete_table(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issues a new QR token; printed codes carrying the old one stop working
pub async fn regenerate_qr_code(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<restaurant_table::Model> {
    let table = state.services.tables.regenerate_qr_code(&user, id).await?;
    Ok(Json(ApiResponse::success(table)))
}

#[utoipa::path(
    get,
    path = "/api/v1/public/tables/{qr_code}",
    summary = "Resolve table QR code",
    description = "Returns the table, its branch and the branch menu for a scanned QR code",
    params(("qr_code" = String, Path, description = "QR token printed on the table")),
    responses(
        (status = 200, description = "Table resolved", body = ApiResponse<QrResolution>),
        (status = 400, description = "Table ordering disabled for the branch", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown or inactive table", body = crate::errors::ErrorResponse),
    ),
    tag = "tables"
)]
pub async fn resolve_qr(
    State(state): State<AppState>,
    Path(qr_code): Path<String>,
) -> ApiResult<QrResolution> {
    let resolution = state.services.tables.resolve_qr(&qr_code).await?;
    Ok(Json(ApiResponse::success(resolution)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}/summary",
    summary = "Open bill of a table",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Open orders and running total", body = ApiResponse<TableSummary>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tables"
)]
pub async fn table_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TableSummary> {
    let summary = state.services.tables.table_summary(&user, id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    post,
    path = "/api/v1/tables/{id}/collect",
    summary = "Collect payment for a table",
    description = "Settles every open order of the table in one payment and frees the table",
    params(("id" = Uuid, Path, description = "Table ID")),
    request_body = CollectTableRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<PaymentResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Nothing to collect or collected concurrently", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tables"
)]
pub async fn collect_table(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CollectTableRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let payment = state
        .services
        .tables
        .collect_table(&user, id, payload)
        .await?;
    Ok(created_response(payment))
}

#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}/payments",
    summary = "Payments collected at a table",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tables"
)]
pub async fn table_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<PaymentResponse>> {
    let query = PaymentQuery {
        branch_id: None,
        table_id: Some(id),
    };
    let payments = state.services.tables.list_payments(&user, query).await?;
    Ok(Json(ApiResponse::success(payments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/table-payments",
    summary = "Table payments of a branch",
    params(PaymentQuery),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 400, description = "Neither branch_id nor table_id given", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "tables"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PaymentQuery>,
) -> ApiResult<Vec<PaymentResponse>> {
    let payments = state.services.tables.list_payments(&user, query).await?;
    Ok(Json(ApiResponse::success(payments)))
}

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/public/tables/:qr_code", get(resolve_qr));

    let read = Router::new()
        .route("/tables", get(list_tables))
        .route("/tables/:id", get(get_table))
        .route("/tables/:id/summary", get(table_summary))
        .route("/tables/:id/payments", get(table_payments))
        .route("/table-payments", get(list_payments))
        .with_permission(perm::TABLES_READ);

    let create = Router::new()
        .route("/tables", post(create_table))
        .with_permission(perm::TABLES_CREATE);

    let update = Router::new()
        .route("/tables/:id", put(update_table))
        .route("/tables/:id/qr-code", post(regenerate_qr_code))
        .with_permission(perm::TABLES_UPDATE);

    let remove = Router::new()
        .route("/tables/:id", delete(delete_table))
        .with_permission(perm::TABLES_DELETE);

    let collect = Router::new()
        .route("/tables/:id/collect", post(collect_table))
        .with_permission(perm::TABLES_COLLECT);

    public
        .merge(read)
        .merge(create)
        .merge(update)
        .merge(remove)
        .merge(collect)
}
