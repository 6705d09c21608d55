mod common;

use axum::http::{Method, StatusCode};
use common::{amount, id_of, json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn guest_table_order_prices_items_from_the_menu() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("guest").await;

    let order = app.place_table_order(&fx, 2).await;

    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["order_type"], "TABLE");
    assert_eq!(order["table_id"], fx.table_id.to_string());
    assert!(order["user_id"].is_null());
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    // 2 x 120.50 + 1 x 25.00
    assert_eq!(amount(&order["total_amount"]), 266.0);
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));

    let table = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/tables/{}", fx.table_id), None)
            .await,
    )
    .await;
    assert_eq!(table["data"]["status"], "OCCUPIED");
}

#[tokio::test]
async fn orders_without_items_are_rejected() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("empty").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/orders",
            Some(json!({
                "branch_id": fx.branch_id,
                "order_type": "TAKEAWAY",
                "customer_name": "Zeynep",
                "items": []
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quantity_and_foreign_products_are_validated() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("valid").await;
    let other = app.seed_fixture("other").await;

    for items in [
        json!([{ "product_id": fx.burger_id, "quantity": 0 }]),
        json!([{ "product_id": fx.burger_id, "quantity": 100 }]),
        json!([{ "product_id": other.burger_id, "quantity": 1 }]),
    ] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/public/orders",
                Some(json!({
                    "branch_id": fx.branch_id,
                    "order_type": "TAKEAWAY",
                    "customer_name": "Zeynep",
                    "items": items
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "items {}", items);
    }
}

#[tokio::test]
async fn delivery_needs_contact_details_and_address() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("delivery").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/orders",
            Some(json!({
                "branch_id": fx.branch_id,
                "order_type": "DELIVERY",
                "customer_name": "Can",
                "customer_phone": "05321112233",
                "items": [{ "product_id": fx.burger_id, "quantity": 1 }]
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/orders",
            Some(json!({
                "branch_id": fx.branch_id,
                "order_type": "DELIVERY",
                "customer_name": "Can",
                "customer_phone": "05321112233",
                "delivery_address": "Bağdat Caddesi 100, Kadıköy",
                "payment_method": "CASH",
                "items": [{ "product_id": fx.burger_id, "quantity": 1 }]
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = json_body(response).await["data"].clone();
    assert!(order["customer_id"].is_string());
    assert_eq!(order["payment_method"], "CASH");

    let customers = json_body(
        app.request_authenticated(Method::GET, "/api/v1/customers?search=0532", None)
            .await,
    )
    .await;
    assert_eq!(customers["data"]["total"], 1);
    assert_eq!(customers["data"]["items"][0]["name"], "Can");
}

#[tokio::test]
async fn status_follows_the_kitchen_flow() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("flow").await;
    let order = app.place_table_order(&fx, 1).await;
    let status_uri = format!("/api/v1/orders/{}/status", id_of(&order));

    // Skipping the kitchen is not allowed
    let response = app
        .request_authenticated(Method::PUT, &status_uri, Some(json!({ "status": "COMPLETED" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for next in ["PREPARING", "READY", "DELIVERED", "COMPLETED"] {
        let response = app
            .request_authenticated(Method::PUT, &status_uri, Some(json!({ "status": next })))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "transition to {}", next);
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], next);
    }

    // Terminal orders stay terminal
    let response = app
        .request_authenticated(Method::PUT, &status_uri, Some(json!({ "status": "PREPARING" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let table = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/tables/{}", fx.table_id), None)
            .await,
    )
    .await;
    assert_eq!(table["data"]["status"], "AVAILABLE");
}

#[tokio::test]
async fn unknown_status_values_are_rejected() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("unknown").await;
    let order = app.place_table_order(&fx, 1).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", id_of(&order)),
            Some(json!({ "status": "EATEN" })),
        )
        .await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn tracking_by_order_number_hides_personal_data() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("track").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/orders",
            Some(json!({
                "branch_id": fx.branch_id,
                "order_type": "TAKEAWAY",
                "customer_name": "Elif",
                "customer_phone": "05440001122",
                "items": [{ "product_id": fx.ayran_id, "quantity": 3 }]
            })),
            None,
        )
        .await;
    let order = json_body(response).await["data"].clone();
    let number = order["order_number"].as_str().unwrap();

    let response = app
        .request(Method::GET, &format!("/api/v1/public/orders/{}", number), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["items"][0]["quantity"], 3);
    assert!(body["data"].get("customer_phone").is_none());

    let response = app
        .request(Method::GET, "/api/v1/public/orders/ORD-000000-NOPE00", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signed_in_customer_orders_with_saved_address() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("saved").await;
    let token = app.register_customer("hungry@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/me/addresses",
            Some(json!({
                "title": "Home",
                "address_line": "Caferağa Mahallesi, Sakız Sokak 3",
                "district": "Kadıköy",
                "city": "İstanbul",
                "is_default": true
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let address = json_body(response).await["data"].clone();

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "branch_id": fx.branch_id,
                "order_type": "DELIVERY",
                "customer_phone": "05551234567",
                "address_id": id_of(&address),
                "items": [{ "product_id": fx.burger_id, "quantity": 1 }]
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = json_body(response).await["data"].clone();
    assert!(order["delivery_address"]
        .as_str()
        .unwrap()
        .contains("Sakız Sokak 3"));
    assert_eq!(order["customer_name"], "Ayşe Yılmaz");

    let mine = json_body(
        app.request(Method::GET, "/api/v1/orders/mine", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
    assert_eq!(mine["data"][0]["id"], order["id"]);
}

#[tokio::test]
async fn staff_list_is_paginated_and_filtered() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("paged").await;
    for _ in 0..3 {
        app.place_table_order(&fx, 1).await;
    }
    let first = app.place_table_order(&fx, 1).await;
    app.request_authenticated(
        Method::POST,
        &format!("/api/v1/orders/{}/cancel", id_of(&first)),
        None,
    )
    .await;

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/orders?branch_id={}&page=1&limit=2", fx.branch_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/orders?branch_id={}&status=CANCELLED", fx.branch_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], first["id"]);
}

#[tokio::test]
async fn deleting_an_order_frees_its_table() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("delete").await;
    let order = app.place_table_order(&fx, 1).await;

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/orders/{}", id_of(&order)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/orders/{}", id_of(&order)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let table = json_body(
        app.request_authenticated(Method::GET, &format!("/api/v1/tables/{}", fx.table_id), None)
            .await,
    )
    .await;
    assert_eq!(table["data"]["status"], "AVAILABLE");
}
