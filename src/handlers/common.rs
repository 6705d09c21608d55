use crate::services::Pagination;
use crate::{ApiResponse, PaginatedResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Wraps one page of results together with its paging metadata
pub fn paginated<T>(items: Vec<T>, total: u64, page: u64, limit: u64) -> PaginatedResponse<T> {
    let pagination = Pagination::new(page, limit);
    let total_pages = if total == 0 {
        0
    } else {
        (total + pagination.limit - 1) / pagination.limit
    };
    PaginatedResponse {
        items,
        total,
        page: pagination.page,
        limit: pagination.limit,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_round_up() {
        let page = paginated(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.limit, 20);

        let empty = paginated::<u8>(vec![], 0, 0, 0);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.limit, 1);
    }
}
