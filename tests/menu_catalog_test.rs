mod common;

use axum::http::{Method, StatusCode};
use common::{amount, id_of, json_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn public_menu_lists_available_products_by_category() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("menu").await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/public/branches/{}/menu", fx.branch_id),
            None,
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let menu = &body["data"];
    assert_eq!(menu["branch_name"], "Kadıköy");
    assert_eq!(menu["currency"], "TRY");
    let categories = menu["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    let products = categories[0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], "Classic Burger");
    assert_eq!(amount(&products[0]["price"]), 120.5);
}

#[tokio::test]
async fn unavailable_products_leave_the_cached_menu() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("avail").await;
    let menu_uri = format!("/api/v1/public/branches/{}/menu", fx.branch_id);

    // Prime the cache
    let response = app.request(Method::GET, &menu_uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/products/{}/availability", fx.ayran_id),
            Some(json!({ "is_available": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(app.request(Method::GET, &menu_uri, None, None).await).await;
    let products = body["data"]["categories"][0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], fx.burger_id.to_string());
}

#[tokio::test]
async fn negative_prices_are_rejected() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("price").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "branch_id": fx.branch_id,
                "category_id": fx.category_id,
                "name": "Free Lunch",
                "price": "-1.00"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_category_must_belong_to_the_branch() {
    let app = TestApp::new().await;
    let first = app.seed_fixture("first").await;
    let second = app.seed_fixture("second").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "branch_id": first.branch_id,
                "category_id": second.category_id,
                "name": "Lahmacun",
                "price": "60"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn categories_are_listed_per_branch_and_can_be_updated() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("cats").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "branch_id": fx.branch_id, "name": "Drinks", "sort_order": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let drinks = json_body(response).await["data"].clone();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/categories/{}", id_of(&drinks)),
            Some(json!({ "name": "Beverages" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(
        app.request_authenticated(
            Method::GET,
            &format!("/api/v1/categories?branch_id={}", fx.branch_id),
            None,
        )
        .await,
    )
    .await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Beverages", "Burgers"]);
}

#[tokio::test]
async fn branch_manager_is_confined_to_own_branch() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("confined").await;

    let other_branch = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/branches",
            Some(json!({
                "company_id": fx.company_id,
                "name": "Beşiktaş",
                "address": "Barbaros Bulvarı 5, Beşiktaş"
            })),
        )
        .await,
    )
    .await["data"]
        .clone();

    let manager = app
        .staff_token(
            "manager@confined.example.com",
            "BRANCH_MANAGER",
            fx.company_id,
            Some(fx.branch_id),
        )
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "branch_id": fx.branch_id, "name": "Desserts" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "branch_id": id_of(&other_branch), "name": "Desserts" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn categories_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;
    let fx = app.seed_fixture("inuse").await;

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/categories/{}", fx.category_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let empty = json_body(
        app.request_authenticated(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "branch_id": fx.branch_id, "name": "Desserts" })),
        )
        .await,
    )
    .await["data"]
        .clone();
    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/categories/{}", id_of(&empty)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
