mod common;

use axum::http::{Method, StatusCode};
use common::{amount, id_of, json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn qr_code_resolves_to_table_and_menu() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("qr").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/public/tables/{}", fx.qr_code),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["table_id"], fx.table_id.to_string());
    assert_eq!(body["data"]["table_number"], 7);
    assert_eq!(body["data"]["branch_name"], "Kadıköy");
    assert!(!body["data"]["menu"]["categories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn regenerated_qr_code_invalidates_the_old_one() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("regen").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/tables/{}/qr-code", fx.table_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let table = json_body(response).await["data"].clone();
    let fresh = table["qr_code"].as_str().unwrap();
    assert_ne!(fresh, fx.qr_code);

    let response = app
        .request(Method::GET, &format!("/api/v1/public/tables/{}", fx.qr_code), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, &format!("/api/v1/public/tables/{}", fresh), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn table_numbers_are_unique_per_branch() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("dupe").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/tables",
            Some(json!({ "branch_id": fx.branch_id, "table_number": 7 })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn summary_sums_open_orders_of_the_table() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("summary").await;
    app.place_table_order(&fx, 1).await;
    let cancelled = app.place_table_order(&fx, 3).await;
    app.request_authenticated(
        Method::POST,
        &format!("/api/v1/orders/{}/cancel", id_of(&cancelled)),
        None,
    )
    .await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/tables/{}/summary", fx.table_id),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "OCCUPIED");
    assert_eq!(body["data"]["open_orders"].as_array().unwrap().len(), 1);
    assert_eq!(amount(&body["data"]["total_amount"]), 145.5);
}

#[tokio::test]
async fn collecting_settles_every_open_order_once() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("collect").await;
    let first = app.place_table_order(&fx, 1).await;
    let second = app.place_table_order(&fx, 2).await;
    let collect_uri = format!("/api/v1/tables/{}/collect", fx.table_id);

    let response = app
        .request_authenticated(
            Method::POST,
            &collect_uri,
            Some(json!({ "payment_method": "CARD", "note": "split between two" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = json_body(response).await["data"].clone();
    assert_eq!(amount(&payment["amount"]), 145.5 + 266.0);
    assert_eq!(payment["order_count"], 2);
    assert_eq!(payment["payment_method"], "CARD");
    let settled: Vec<&str> = payment["order_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap())
        .collect();
    assert!(settled.contains(&first["id"].as_str().unwrap()));
    assert!(settled.contains(&second["id"].as_str().unwrap()));

    for order in [&first, &second] {
        let body = json_body(
            app.request_authenticated(
                Method::GET,
                &format!("/api/v1/orders/{}", id_of(order)),
                None,
            )
            .await,
        )
        .await;
        assert_eq!(body["data"]["status"], "COMPLETED");
        assert_eq!(body["data"]["payment_method"], "CARD");
    }

    // Nothing left to collect
    let response = app
        .request_authenticated(
            Method::POST,
            &collect_uri,
            Some(json!({ "payment_method": "CASH" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/tables/{}", fx.table_id), None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["status"], "AVAILABLE");
    assert!(body["data"]["opened_at"].is_null());

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/tables/{}/payments", fx.table_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/table-payments?branch_id={}", fx.branch_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"][0]["id"], payment["id"]);
}

#[tokio::test]
async fn branch_manager_collects_only_own_tables() {
    let app = TestApp::new().await;
    let ours = app.seed_fixture("waiters").await;
    let theirs = app.seed_fixture("rivals").await;
    app.place_table_order(&theirs, 1).await;
    let manager = app
        .staff_token(
            "manager@waiters.example.com",
            "BRANCH_MANAGER",
            ours.company_id,
            Some(ours.branch_id),
        )
        .await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/tables/{}/collect", theirs.table_id),
            Some(json!({ "payment_method": "CASH" })),
            Some(&manager),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn customers_cannot_collect() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("nocollect").await;
    app.place_table_order(&fx, 1).await;
    let token = app.register_customer("diner@example.com").await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/tables/{}/collect", fx.table_id),
            Some(json!({ "payment_method": "CASH" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tables_with_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("busy").await;
    let order = app.place_table_order(&fx, 1).await;
    let table_uri = format!("/api/v1/tables/{}", fx.table_id);

    let response = app
        .request_authenticated(Method::DELETE, &table_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/orders/{}", id_of(&order)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(Method::DELETE, &table_uri, None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request_authenticated(Method::GET, &table_uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
