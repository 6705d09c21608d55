use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use tracing::{info, warn};

use crate::auth::{consts as perm, AuthRouterExt, AuthUser};
use crate::{errors::ServiceError, handlers::common::created_response, AppState};

const FILE_FIELD: &str = "file";

/// Accepts a multipart form with a single `file` field holding an image
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServiceError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(multipart_error)?;
        let stored = state
            .services
            .uploads
            .store_image(&file_name, &content)
            .await?;
        info!(user_id = %user.user_id, url = %stored.url, "Upload stored");
        return Ok(created_response(stored));
    }

    Err(ServiceError::ValidationError(format!(
        "Multipart field '{}' is required",
        FILE_FIELD
    )))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServiceError::PayloadTooLarge("Upload exceeds the size limit".to_string());
    }
    warn!(error = %err, "Malformed multipart body");
    ServiceError::BadRequest(err.body_text())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(upload_image))
        .with_permission(perm::UPLOADS_CREATE)
}
