use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::entities::company;
use crate::services::companies::{CompanyWithBranches, CreateCompanyRequest, UpdateCompanyRequest};
use crate::{errors::ServiceError, handlers::common::created_response, ApiResponse, ApiResult, AppState};

pub async fn list_companies(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<company::Model>> {
    let companies = state.services.companies.list_companies(&user).await?;
    Ok(Json(ApiResponse::success(companies)))
}

pub async fn create_company(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let company = state.services.companies.create_company(&user, payload).await?;
    Ok(created_response(company))
}

pub async fn get_company(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<company::Model> {
    let company = state.services.companies.get_company(&user, id).await?;
    Ok(Json(ApiResponse::success(company)))
}

pub async fn update_company(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyRequest>,
) -> ApiResult<company::Model> {
    let company = state
        .services
        .companies
        .update_company(&user, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(company)))
}

pub async fn delete_company(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.companies.delete_company(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolves the tenant behind a storefront host name
pub async fn company_by_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<CompanyWithBranches> {
    let company = state.services.companies.resolve_by_domain(&domain).await?;
    Ok(Json(ApiResponse::success(company)))
}

pub fn routes() -> Router<AppState> {
    let public = Router::new().route("/public/companies/by-domain/:domain", get(company_by_domain));

    let read = Router::new()
        .route("/companies", get(list_companies))
        .route("/companies/:id", get(get_company))
        .with_permission(perm::COMPANIES_READ);

    let create = Router::new()
        .route("/companies", post(create_company))
        .with_permission(perm::COMPANIES_CREATE);

    let update = Router::new()
        .route("/companies/:id", put(update_company))
        .with_permission(perm::COMPANIES_UPDATE);

    let remove = Router::new()
        .route("/companies/:id", delete(delete_company))
        .with_permission(perm::COMPANIES_DELETE);

    public.merge(read).merge(create).merge(update).merge(remove)
}
