use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::entities::{customer, user_address};
use crate::services::customers::{CreateAddressRequest, CustomerQuery};
use crate::{
    errors::ServiceError,
    handlers::common::{created_response, paginated},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

pub async fn list_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let (page, limit) = (query.page, query.limit);
    let (customers, total) = state.services.customers.list_customers(&user, query).await?;
    Ok(Json(ApiResponse::success(paginated(
        customers, total, page, limit,
    ))))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<user_address::Model>> {
    let addresses = state.services.customers.list_addresses(&user).await?;
    Ok(Json(ApiResponse::success(addresses)))
}

pub async fn create_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAddressRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state
        .services
        .customers
        .create_address(&user, payload)
        .await?;
    Ok(created_response(address))
}

pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.customers.delete_address(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    let customers = Router::new()
        .route("/customers", get(list_customers))
        .with_permission(perm::CUSTOMERS_READ);

    let addresses = Router::new()
        .route("/me/addresses", get(list_addresses).post(create_address))
        .route("/me/addresses/:id", delete(delete_address))
        .with_permission(perm::ADDRESSES_MANAGE);

    customers.merge(addresses)
}
