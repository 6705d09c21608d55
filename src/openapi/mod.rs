use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Restaurant API",
        version = "1.0.0",
        description = r#"
# Restaurant Ordering and Administration API

Multi-tenant backend for restaurant companies and their branches.

## Features

- **Tenancy**: Companies resolved by domain, branches with their own menus
- **Menu**: Categories and products per branch, public cached menu
- **Ordering**: Dine-in via table QR codes, takeaway and delivery
- **Table service**: Open bills, single-payment collection, payment history
- **Back office**: Dashboard, archived sales records, franchise applications
- **Operations**: Image uploads, demo data, database backups

## Authentication

Staff and customer endpoints expect a JWT access token from `/api/v1/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Endpoints under `/api/v1/public` are open.

## Error Handling

Errors share one JSON shape with the matching HTTP status code:

```json
{
  "error": "Conflict",
  "message": "Conflict: Table has no open orders to collect",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-12-09T10:30:00.000Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration and sign in"),
        (name = "menu", description = "Public branch menus"),
        (name = "orders", description = "Order placement, tracking and handling"),
        (name = "tables", description = "Table QR codes, bills and payments"),
        (name = "dashboard", description = "Branch figures"),
        (name = "chat", description = "Storefront assistant")
    ),
    paths(
        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,

        // Menu
        crate::handlers::branches::branch_menu,

        // Orders
        crate::handlers::orders::place_public_order,
        crate::handlers::orders::track_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::my_orders,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::delete_order,

        // Tables
        crate::handlers::tables::resolve_qr,
        crate::handlers::tables::table_summary,
        crate::handlers::tables::collect_table,
        crate::handlers::tables::table_payments,
        crate::handlers::tables::list_payments,

        // Back office
        crate::handlers::dashboard::dashboard,
        crate::handlers::chat::send_message,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            crate::services::users::RegisterRequest,
            crate::services::users::LoginRequest,
            crate::services::users::AuthResponse,

            crate::services::branches::BranchMenu,

            crate::services::orders::PlaceOrderRequest,
            crate::services::orders::OrderItemRequest,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::CancelOrderRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderTracking,
            crate::entities::order::OrderStatus,
            crate::entities::order::OrderType,
            crate::entities::order::PaymentMethod,

            crate::services::tables::CollectTableRequest,
            crate::services::tables::QrResolution,
            crate::services::tables::TableSummary,
            crate::services::tables::PaymentResponse,

            crate::services::dashboard::DashboardStats,
            crate::services::chatbot::ChatRequest,
            crate::services::chatbot::ChatReply,
            crate::services::uploads::UploadResponse,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

/// Registers the `Bearer` scheme referenced by secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_order_and_table_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Restaurant API"));
        assert!(json.contains("/api/v1/public/orders"));
        assert!(json.contains("/api/v1/tables/{id}/collect"));
        assert!(json.contains("\"Bearer\""));
    }
}
