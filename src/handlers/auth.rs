use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::{bearer_token, consts as perm, AuthRouterExt, AuthUser};
use crate::services::users::{
    AuthResponse, CreateStaffUserRequest, LoginRequest, RegisterRequest, UserProfile,
};
use crate::{errors::ServiceError, handlers::common::created_response, ApiResponse, ApiResult, AppState};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserQuery {
    pub company_id: Option<Uuid>,
}

/// Self-service customer registration
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let response = state.services.users.register(payload).await?;
    info!(user_id = %response.user.id, "Customer registered");
    Ok(created_response(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.services.users.login(payload).await?;
    Ok(Json(ApiResponse::success(response)))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ServiceError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))?;
    state.services.users.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    let profile = state.services.users.me(&user).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<UserProfile>> {
    let users = state
        .services
        .users
        .list_users(&user, query.company_id)
        .await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStaffUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.users.create_staff_user(&user, payload).await?;
    Ok(created_response(created))
}

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));

    let session = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .with_auth();

    let users = Router::new()
        .route("/users", get(list_users).post(create_user))
        .with_permission(perm::USERS_MANAGE);

    public.merge(session).merge(users)
}
