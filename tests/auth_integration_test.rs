mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_returns_token_and_customer_profile() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Mehmet Demir",
                "email": "Mehmet@Example.com",
                "password": "a-long-password"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "mehmet@example.com");
    assert_eq!(body["data"]["user"]["role"], "CUSTOMER");
    assert_eq!(body["data"]["token"]["token_type"], "Bearer");
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new().await;
    app.register_customer("dup@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Someone Else",
                "email": "dup@example.com",
                "password": "another-password"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register_customer("wrong@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "wrong@example.com", "password": "not-the-password" })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn short_password_fails_validation() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({ "name": "Kısa", "email": "short@example.com", "password": "123" })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_requires_a_token() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/auth/me", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["role"], "SUPER_ADMIN");
    assert_eq!(body["data"]["email"], common::ADMIN_EMAIL);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::new().await;
    let token = app.register_customer("logout@example.com").await;

    let response = app
        .request(Method::POST, "/api/v1/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_cannot_reach_staff_endpoints() {
    let app = TestApp::new().await;
    let token = app.register_customer("curious@example.com").await;

    for uri in ["/api/v1/orders", "/api/v1/companies", "/api/v1/dashboard", "/api/v1/users"] {
        let response = app.request(Method::GET, uri, None, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "GET {}", uri);
    }
}

#[tokio::test]
async fn company_admin_only_creates_staff_for_own_company() {
    let app = TestApp::new().await;
    let ours = app.seed_fixture("ours").await;
    let theirs = app.seed_fixture("theirs").await;
    let admin = app
        .staff_token("admin@ours.example.com", "COMPANY_ADMIN", ours.company_id, None)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "name": "Branch Lead",
                "email": "lead@ours.example.com",
                "password": "lead-password",
                "role": "BRANCH_MANAGER",
                "branch_id": ours.branch_id
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["company_id"], ours.company_id.to_string());

    let response = app
        .request(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "name": "Intruder",
                "email": "intruder@theirs.example.com",
                "password": "intruder-password",
                "role": "COMPANY_ADMIN",
                "company_id": theirs.company_id
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "name": "Promoted",
                "email": "root2@ours.example.com",
                "password": "promoted-password",
                "role": "SUPER_ADMIN"
            })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
