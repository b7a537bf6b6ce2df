#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        visitor_log::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        Self::with_pool(pool).await
    }

    /// Build an app over an existing database, as a process restart would.
    pub async fn with_pool(pool: SqlitePool) -> Self {
        let router = visitor_log::build_app(pool.clone())
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    pub async fn restart(&self) -> Self {
        Self::with_pool(self.db.clone()).await
    }

    /// Write a raw payload under the visitors key, bypassing the app.
    pub async fn seed_store(&self, raw: &str) {
        sqlx::query("INSERT INTO kv_store (key, value, updated_at) VALUES ('visitors', ?, '')")
            .bind(raw)
            .execute(&self.db)
            .await
            .expect("Failed to seed store");
    }

    /// Write a SQL expression's value under the visitors key, for payloads
    /// that can't be bound as text.
    pub async fn seed_store_expr(&self, expr: &str) {
        let sql = format!(
            "INSERT INTO kv_store (key, value, updated_at) VALUES ('visitors', {expr}, '')"
        );
        sqlx::query(&sql)
            .execute(&self.db)
            .await
            .expect("Failed to seed store");
    }

    /// Make every later write to the store fail.
    pub async fn break_store(&self) {
        sqlx::query("DROP TABLE kv_store")
            .execute(&self.db)
            .await
            .expect("Failed to drop store table");
    }

    /// Raw payload currently persisted under the visitors key.
    pub async fn stored_payload(&self) -> Option<String> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_store WHERE key = 'visitors'")
                .fetch_optional(&self.db)
                .await
                .unwrap();
        row.map(|(value,)| value)
    }

    /// Persisted visitors as parsed JSON.
    pub async fn stored_visitors(&self) -> Vec<serde_json::Value> {
        match self.stored_payload().await {
            Some(raw) => serde_json::from_str(&raw).unwrap(),
            None => Vec::new(),
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request.
    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    /// Send an empty POST the way htmx does.
    pub async fn post_htmx(&self, uri: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("POST")
            .header("hx-request", "true")
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    /// Register a visitor through the form and return its id.
    pub async fn register(&self, name: &str, purpose: &str) -> String {
        let body = format!("name={name}&purpose={purpose}");
        let resp = self.post_form("/visitors", &body).await;
        assert_redirect(&resp, "/");

        let visitors = self.stored_visitors().await;
        visitors
            .last()
            .and_then(|v| v["id"].as_str())
            .expect("Registration should persist a visitor")
            .to_string()
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}

/// Assert that an HX-Redirect header points to the expected location.
pub fn assert_hx_redirect(resp: &Response, expected_location: &str) {
    let hx = resp
        .headers()
        .get("hx-redirect")
        .expect("Expected HX-Redirect header")
        .to_str()
        .unwrap();
    assert_eq!(hx, expected_location);
}
