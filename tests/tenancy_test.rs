mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn company_is_resolved_by_domain() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("kebap").await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/public/companies/by-domain/KEBAP.example.com",
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["company"]["id"], fx.company_id.to_string());
    assert_eq!(body["data"]["company"]["slug"], "kebap");
    assert_eq!(body["data"]["branches"][0]["id"], fx.branch_id.to_string());

    let response = app
        .request(
            Method::GET,
            "/api/v1/public/companies/by-domain/unknown.example.com",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn domains_are_unique_across_companies() {
    let app = TestApp::new().await;
    let first = app.seed_fixture("pide").await;
    app.seed_fixture("doner").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "name": "Copycat", "domain": "pide.example.com" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Keeping its own domain is not a clash
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/companies/{}", first.company_id),
            Some(json!({ "domain": "pide.example.com", "name": "Pide Evi" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/companies/{}", first.company_id),
            Some(json!({ "domain": "doner.example.com" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_super_admins_create_companies() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("corp").await;
    let admin = app
        .staff_token("admin@corp.example.com", "COMPANY_ADMIN", fx.company_id, None)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "name": "Side Business" })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn company_admin_sees_only_own_branches() {
    let app = TestApp::new().await;
    let ours = app.seed_fixture("mine").await;
    let theirs = app.seed_fixture("yours").await;
    let admin = app
        .staff_token("admin@mine.example.com", "COMPANY_ADMIN", ours.company_id, None)
        .await;

    let body = json_body(
        app.request(Method::GET, "/api/v1/branches", None, Some(&admin))
            .await,
    )
    .await;
    let ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![ours.branch_id.to_string()]);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/branches/{}", theirs.branch_id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn branch_with_active_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("busy").await;
    let order = app.place_table_order(&fx, 1).await;
    let branch_uri = format!("/api/v1/branches/{}", fx.branch_id);

    let response = app
        .request_authenticated(Method::DELETE, &branch_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", id_of(&order)),
            Some(json!({ "reason": "closing early" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::DELETE, &branch_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(Method::GET, &branch_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/public/tables/{}", fx.qr_code),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivated_branch_stops_taking_orders() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("closed").await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/branches/{}", fx.branch_id),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/orders",
            Some(json!({
                "branch_id": fx.branch_id,
                "order_type": "TAKEAWAY",
                "customer_name": "Ali",
                "items": [{ "product_id": fx.burger_id, "quantity": 1 }]
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn companies_with_branches_cannot_be_deleted() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("closing").await;
    let company_uri = format!("/api/v1/companies/{}", fx.company_id);

    let response = app
        .request_authenticated(Method::DELETE, &company_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/branches/{}", fx.branch_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(Method::DELETE, &company_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request_authenticated(Method::GET, &company_uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
