mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{amount, json_body, TestApp};
use serde_json::json;

const BOUNDARY: &str = "----restaurant-test-boundary";

fn multipart_upload(token: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("build multipart request")
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/health/live", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response).await;
    assert_eq!(doc["info"]["title"], "Restaurant API");

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_counts_todays_orders() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("dash").await;
    app.place_table_order(&fx, 1).await;
    app.place_table_order(&fx, 2).await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/dashboard?branch_id={}", fx.branch_id),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await["data"].clone();
    assert_eq!(stats["orders_today"], 2);
    assert_eq!(stats["active_orders"], 2);
    assert_eq!(stats["occupied_tables"], 1);
    assert_eq!(stats["orders_by_status"]["PENDING"], 2);
    assert_eq!(stats["orders_by_status"]["COMPLETED"], 0);
    assert_eq!(amount(&stats["revenue_today"]), 0.0);
    assert_eq!(stats["top_products"][0]["product_name"], "Classic Burger");
}

#[tokio::test]
async fn archival_moves_finished_orders_into_sales_records() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("archive").await;
    app.place_table_order(&fx, 1).await;
    let collect = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/tables/{}/collect", fx.table_id),
            Some(json!({ "payment_method": "CASH" })),
        )
        .await;
    assert_eq!(collect.status(), StatusCode::CREATED);
    let still_open = app.place_table_order(&fx, 1).await;

    // Nothing is old enough yet
    let archived = app
        .state
        .services
        .archival
        .archive_stale_orders(Utc::now())
        .await
        .unwrap();
    assert_eq!(archived, 0);

    let archived = app
        .state
        .services
        .archival
        .archive_stale_orders(Utc::now() + Duration::hours(13))
        .await
        .unwrap();
    assert_eq!(archived, 1);

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/sales-records?branch_id={}", fx.branch_id),
            None,
        )
        .await,
    )
    .await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "COMPLETED");
    assert_eq!(records[0]["payment_method"], "CASH");
    assert_eq!(amount(&records[0]["total_amount"]), 145.5);
    assert_eq!(records[0]["items"].as_array().unwrap().len(), 2);

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/orders?branch_id={}", fx.branch_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], still_open["id"]);
}

#[tokio::test]
async fn served_table_orders_wait_for_collection_before_archival() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("served").await;
    let order = app.place_table_order(&fx, 1).await;
    let status_uri = format!("/api/v1/orders/{}/status", order["id"].as_str().unwrap());
    for next in ["PREPARING", "READY", "DELIVERED"] {
        let response = app
            .request_authenticated(Method::PUT, &status_uri, Some(json!({ "status": next })))
            .await;
        assert_eq!(response.status(), StatusCode::OK, "transition to {}", next);
    }

    let later = Utc::now() + Duration::hours(13);
    let archived = app
        .state
        .services
        .archival
        .archive_stale_orders(later)
        .await
        .unwrap();
    assert_eq!(archived, 0);

    let summary = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/tables/{}/summary", fx.table_id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(summary["data"]["status"], "OCCUPIED");
    assert_eq!(amount(&summary["data"]["total_amount"]), 145.5);

    let collect_uri = format!("/api/v1/tables/{}/collect", fx.table_id);
    let response = app
        .request_authenticated(
            Method::POST,
            &collect_uri,
            Some(json!({ "payment_method": "CASH" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(amount(&json_body(response).await["data"]["amount"]), 145.5);

    let response = app
        .request_authenticated(
            Method::POST,
            &collect_uri,
            Some(json!({ "payment_method": "CASH" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Collected, so now it is finished
    let archived = app
        .state
        .services
        .archival
        .archive_stale_orders(later)
        .await
        .unwrap();
    assert_eq!(archived, 1);
}

#[tokio::test]
async fn chat_answers_from_branch_data_and_keeps_history() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("chat").await;
    let order = app.place_table_order(&fx, 1).await;
    let number = order["order_number"].as_str().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/chat",
            Some(json!({
                "session_id": "sess-1",
                "branch_id": fx.branch_id,
                "message": "Saat kaçta açıksınız?"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reply = json_body(response).await["data"].clone();
    assert_eq!(reply["intent"], "hours");
    assert!(reply["reply"].as_str().unwrap().contains("10:00-23:00"));

    let response = app
        .request(
            Method::POST,
            "/api/v1/chat",
            Some(json!({
                "session_id": "sess-1",
                "message": format!("siparişim {} ne durumda", number.to_lowercase())
            })),
            None,
        )
        .await;
    let reply = json_body(response).await["data"].clone();
    assert_eq!(reply["intent"], "order_status");
    assert!(reply["reply"].as_str().unwrap().contains("PENDING"));

    let history = json_body(
        app.request(Method::GET, "/api/v1/chat/sess-1", None, None)
            .await,
    )
    .await;
    let messages = history["data"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[1]["sender"], "bot");
}

#[tokio::test]
async fn franchise_applications_are_submitted_and_reviewed() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("franchise").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/franchise-applications",
            Some(json!({
                "company_id": fx.company_id,
                "applicant_name": "Burak Şahin",
                "email": "burak@example.com",
                "phone": "05337778899",
                "city": "İzmir",
                "message": "Alsancak'ta bir şube açmak istiyoruz"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let application = json_body(response).await["data"].clone();
    assert_eq!(application["status"], "PENDING");

    let response = app
        .request(
            Method::POST,
            "/api/v1/public/franchise-applications",
            Some(json!({
                "applicant_name": "X",
                "email": "not-an-email",
                "phone": "1",
                "city": "Y"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!(
                "/api/v1/franchise-applications/{}/status",
                application["id"].as_str().unwrap()
            ),
            Some(json!({ "status": "APPROVED" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            "/api/v1/franchise-applications?status=APPROVED",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["applicant_name"], "Burak Şahin");
}

#[tokio::test]
async fn images_are_uploaded_and_served() {
    let app = TestApp::new().await;
    let png = b"\x89PNG\r\n\x1a\nnot-really-a-png";

    let response = app.send(multipart_upload(app.token(), "burger.PNG", png)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let upload = json_body(response).await["data"].clone();
    let url = upload["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));
    assert_eq!(upload["size"], png.len());

    let response = app.request(Method::GET, url, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(multipart_upload(app.token(), "script.sh", b"#!/bin/sh"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_big = vec![0u8; 80 * 1024];
    let response = app
        .send(multipart_upload(app.token(), "huge.jpg", &too_big))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn admin_tools_are_for_super_admins_only() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("ops").await;
    let company_admin = app
        .staff_token("admin@ops.example.com", "COMPANY_ADMIN", fx.company_id, None)
        .await;

    let response = app
        .request(Method::GET, "/api/v1/admin/db-status", None, Some(&company_admin))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/admin/db-status", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let status = json_body(response).await["data"].clone();
    assert_eq!(status["connected"], true);
    assert!(!status["tables"].as_array().unwrap().is_empty());

    // In-memory databases have nothing to copy
    let response = app
        .request_authenticated(Method::POST, "/api/v1/admin/backup/run", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn demo_seed_is_idempotent() {
    let app = TestApp::new().await;

    let first = json_body(
        app.request_authenticated(Method::POST, "/api/v1/admin/seed", None)
            .await,
    )
    .await;
    assert_eq!(first["data"]["created"], true);

    let second = json_body(
        app.request_authenticated(Method::POST, "/api/v1/admin/seed", None)
            .await,
    )
    .await;
    assert_eq!(second["data"]["created"], false);
    assert_eq!(second["data"]["company_id"], first["data"]["company_id"]);

    let branch_id = first["data"]["branch_ids"][0].as_str().unwrap();
    let menu = json_body(
        app.request(
            Method::GET,
            &format!("/api/v1/public/branches/{}/menu", branch_id),
            None,
            None,
        )
        .await,
    )
    .await;
    assert!(!menu["data"]["categories"].as_array().unwrap().is_empty());
}
