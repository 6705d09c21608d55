//! Shared harness for the integration tests: an in-memory SQLite database,
//! the full application router and a signed-in super admin.
#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use uuid::Uuid;

use restaurant_api::{
    build_router,
    config::AppConfig,
    db,
    events::{self, process_events},
    AppState,
};

pub const ADMIN_EMAIL: &str = "root@restaurant.test";
pub const ADMIN_PASSWORD: &str = "super-secret-pass";
const TEST_JWT_SECRET: &str = "integration_tests_jwt_secret_0123456789abcdef";

/// Ids of a company with one branch, one category, two products and one table
#[derive(Debug, Clone)]
pub struct Fixture {
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub category_id: Uuid,
    pub burger_id: Uuid,
    pub ayran_id: Uuid,
    pub table_id: Uuid,
    pub qr_code: String,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    token: String,
    _upload_dir: TempDir,
    _event_task: JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let upload_dir = tempfile::tempdir().expect("create upload dir");

        let pool = db::establish_connection("sqlite::memory:")
            .await
            .expect("connect to in-memory sqlite");
        db::run_migrations(&pool).await.expect("run migrations");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.upload_dir = upload_dir.path().to_string_lossy().into_owned();
        cfg.max_upload_bytes = 64 * 1024;

        let (sender, rx) = events::channel(256);
        let event_task = tokio::spawn(process_events(rx));

        let state = AppState::new(pool, cfg, sender);
        state
            .services
            .users
            .bootstrap_super_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("bootstrap super admin")
            .expect("super admin created");

        let router = build_router(state.clone()).expect("build router");

        let mut app = Self {
            router,
            state,
            token: String::new(),
            _upload_dir: upload_dir,
            _event_task: event_task,
        };
        app.token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        app
    }

    /// Bearer token of the super admin.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("build request")).await
    }

    /// Sends a prebuilt request, e.g. a multipart upload.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login of {} failed", email);
        let body = json_body(response).await;
        body["data"]["token"]["access_token"]
            .as_str()
            .expect("access token in login response")
            .to_string()
    }

    /// Registers a customer account and returns its token.
    pub async fn register_customer(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                Some(json!({
                    "name": "Ayşe Yılmaz",
                    "email": email,
                    "password": "customer-pass-1",
                    "phone": "05551234567"
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["token"]["access_token"]
            .as_str()
            .expect("access token in register response")
            .to_string()
    }

    /// Creates a staff user as the super admin and signs them in.
    pub async fn staff_token(
        &self,
        email: &str,
        role: &str,
        company_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> String {
        let password = "staff-pass-123";
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/users",
                Some(json!({
                    "name": "Staff Member",
                    "email": email,
                    "password": password,
                    "role": role,
                    "company_id": company_id,
                    "branch_id": branch_id,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "creating {}", email);
        self.login(email, password).await
    }

    /// Creates a company with a fully stocked branch through the API.
    pub async fn seed_fixture(&self, slug: &str) -> Fixture {
        let company = self
            .create_ok(
                "/api/v1/companies",
                json!({ "name": format!("Lezzet {}", slug), "slug": slug, "domain": format!("{}.example.com", slug) }),
            )
            .await;
        let company_id = id_of(&company);

        let branch = self
            .create_ok(
                "/api/v1/branches",
                json!({
                    "company_id": company_id,
                    "name": "Kadıköy",
                    "address": "Moda Caddesi 12, Kadıköy, İstanbul",
                    "phone": "02161234567",
                    "opening_hours": "10:00-23:00"
                }),
            )
            .await;
        let branch_id = id_of(&branch);

        let category = self
            .create_ok(
                "/api/v1/categories",
                json!({ "branch_id": branch_id, "name": "Burgers", "sort_order": 1 }),
            )
            .await;
        let category_id = id_of(&category);

        let burger = self
            .create_ok(
                "/api/v1/products",
                json!({
                    "branch_id": branch_id,
                    "category_id": category_id,
                    "name": "Classic Burger",
                    "price": "120.50"
                }),
            )
            .await;
        let ayran = self
            .create_ok(
                "/api/v1/products",
                json!({
                    "branch_id": branch_id,
                    "category_id": category_id,
                    "name": "Ayran",
                    "price": "25.00",
                    "sort_order": 2
                }),
            )
            .await;

        let table = self
            .create_ok(
                "/api/v1/tables",
                json!({ "branch_id": branch_id, "table_number": 7, "capacity": 4 }),
            )
            .await;

        Fixture {
            company_id,
            branch_id,
            category_id,
            burger_id: id_of(&burger),
            ayran_id: id_of(&ayran),
            table_id: id_of(&table),
            qr_code: table["qr_code"]
                .as_str()
                .expect("table has a qr code")
                .to_string(),
        }
    }

    /// Places a dine-in order through the public endpoint.
    pub async fn place_table_order(&self, fx: &Fixture, burgers: i32) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/public/orders",
                Some(json!({
                    "branch_id": fx.branch_id,
                    "order_type": "TABLE",
                    "qr_code": fx.qr_code,
                    "items": [
                        { "product_id": fx.burger_id, "quantity": burgers },
                        { "product_id": fx.ayran_id, "quantity": 1, "notes": "cold" }
                    ]
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["data"].clone()
    }

    async fn create_ok(&self, uri: &str, body: Value) -> Value {
        let response = self
            .request_authenticated(Method::POST, uri, Some(body))
            .await;
        let status = response.status();
        let body = json_body(response).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} returned {}", uri, body);
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is json")
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no id in {}", value))
}

/// Decimal fields may serialize as strings or numbers depending on the backend.
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.as_f64().expect("decimal number"),
        other => panic!("not an amount: {}", other),
    }
}
