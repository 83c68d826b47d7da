//! Integration tests for Real Taste.
//!
//! # Running Tests
//!
//! ```bash
//! # Domain tests run without any services
//! cargo test -p real-taste-integration-tests
//!
//! # API tests need a migrated database and a running server
//! real-taste-cli migrate && real-taste-cli seed
//! cargo run -p real-taste-server &
//! INTEGRATION_BASE_URL=http://localhost:5000 \
//! INTEGRATION_ADMIN_EMAIL=owner@realtastecafe.com \
//! INTEGRATION_ADMIN_PASSWORD=s3cret-pass \
//!     cargo test -p real-taste-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `domain_rules` - Library-level rules (no server needed)
//! - `api_catalog` - Public catalog and settings endpoints
//! - `api_checkout` - Cart, OTP gate and order placement
//! - `api_admin` - Back office endpoints (needs admin credentials)
//! - `api_orders` - Order placement, stock and status lifecycle (needs admin credentials)

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("INTEGRATION_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// Full URL for `path`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url().trim_end_matches('/'))
}

/// A client that keeps the session cookie between requests.
///
/// Each client gets its own `X-Forwarded-For` address so tests do not
/// share a rate limit bucket.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = *uuid::Uuid::new_v4().as_bytes();
    let ip = format!("10.{a}.{b}.{c}");
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        reqwest::header::HeaderValue::from_str(&ip).expect("valid header value"),
    );
    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// An address nobody has registered yet.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Register a fresh customer on `client` and return the response body.
pub async fn register_customer(client: &Client) -> Value {
    let resp = client
        .post(url("/api/users/register"))
        .json(&json!({
            "name": "Integration Customer",
            "email": unique_email(),
            "password": "chai-and-samosa",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    resp.json().await.expect("Failed to read register response")
}

/// Admin credentials from the environment, if configured.
#[must_use]
pub fn admin_credentials() -> Option<(String, String)> {
    let email = std::env::var("INTEGRATION_ADMIN_EMAIL").ok()?;
    let password = std::env::var("INTEGRATION_ADMIN_PASSWORD").ok()?;
    Some((email, password))
}

/// Log `client` in as the configured admin.
///
/// Returns `false` when no admin credentials are configured.
pub async fn login_admin(client: &Client) -> bool {
    let Some((email, password)) = admin_credentials() else {
        return false;
    };
    let resp = client
        .post(url("/api/users/login"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), reqwest::StatusCode::OK, "admin login failed");
    true
}

/// `GET path` and parse the JSON body.
pub async fn get_json(client: &Client, path: &str) -> (reqwest::StatusCode, Value) {
    let resp = client
        .get(url(path))
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

/// First available product with stock, if the catalog has one.
pub async fn first_stocked_product(client: &Client) -> Option<Value> {
    let (_, body) = get_json(client, "/api/products?limit=50").await;
    body["data"]
        .as_array()?
        .iter()
        .find(|p| p["isAvailable"] == true && p["stock"].as_i64().unwrap_or(0) > 0)
        .cloned()
}
