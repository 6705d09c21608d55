use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::entities::chat_message;
use crate::services::chatbot::{ChatReply, ChatRequest};
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    post,
    path = "/api/v1/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ApiResponse<ChatReply>),
        (status = 400, description = "Invalid message", body = crate::errors::ErrorResponse),
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    let reply = state.services.chatbot.handle_message(payload).await?;
    Ok(Json(ApiResponse::success(reply)))
}

pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Vec<chat_message::Model>> {
    let messages = state.services.chatbot.history(&session_id).await?;
    Ok(Json(ApiResponse::success(messages)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(send_message))
        .route("/chat/:session_id", get(session_history))
}
