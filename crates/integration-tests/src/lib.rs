//! Integration tests for the Modish API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p modish-cli -- migrate
//!
//! # Start the API server
//! cargo run -p modish-api
//!
//! # Run the ignored integration tests against it
//! cargo test -p modish-integration-tests -- --ignored
//! ```
//!
//! The server location is taken from `MODISH_TEST_URL`
//! (default `http://localhost:8080`).
//!
//! Tests that manage the catalog log in as the seeded administrator:
//!
//! ```bash
//! cargo run -p modish-cli -- seed --admin-password 'Integr8tion!' --user-password 'Integr8tion!'
//! ```
//!
//! Override the account with `MODISH_TEST_ADMIN_EMAIL` and
//! `MODISH_TEST_ADMIN_PASSWORD`.

#![allow(clippy::missing_panics_doc)]

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

/// Password used for every account these tests create.
pub const TEST_PASSWORD: &str = "Integr8tion!";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("MODISH_TEST_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// HTTP client that keeps the token cookies between requests.
#[must_use]
pub fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh email address that no other run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// A short marker to find the records one test created.
#[must_use]
pub fn unique_tag() -> String {
    format!("it{}", uuid::Uuid::new_v4().simple())
}

/// Log the client in with an existing account.
pub async fn login_as(client: &Client, email: &str, password: &str) {
    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert!(resp.status().is_success(), "login failed: {}", resp.status());
}

/// Client logged in as the seeded administrator.
pub async fn admin_client() -> Client {
    let email =
        std::env::var("MODISH_TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@test.com".to_string());
    let password =
        std::env::var("MODISH_TEST_ADMIN_PASSWORD").unwrap_or_else(|_| TEST_PASSWORD.to_string());
    let client = cookie_client();
    login_as(&client, &email, &password).await;
    client
}

/// Multipart body for the admin item routes: the item JSON in the `data` part.
fn item_form(data: &Value) -> Form {
    let part = Part::text(data.to_string())
        .mime_str("application/json")
        .expect("Failed to build data part");
    Form::new().part("data", part)
}

/// Create a catalog item as admin and return its detail payload.
pub async fn create_item(admin: &Client, data: &Value) -> Value {
    let resp = admin
        .post(format!("{}/api/admin/item", base_url()))
        .multipart(item_form(data))
        .send()
        .await
        .expect("Failed to create item");
    assert!(resp.status().is_success(), "item create failed: {}", resp.status());
    envelope(resp).await["data"].clone()
}

/// Replace a catalog item's fields as admin.
pub async fn update_item(admin: &Client, item_id: i64, data: &Value) -> Value {
    let resp = admin
        .put(format!("{}/api/admin/item/{item_id}", base_url()))
        .multipart(item_form(data))
        .send()
        .await
        .expect("Failed to update item");
    assert!(resp.status().is_success(), "item update failed: {}", resp.status());
    envelope(resp).await["data"].clone()
}

/// Register a new account and log the client in.
///
/// Returns the email of the account.
pub async fn signup_and_login(client: &Client) -> String {
    let base_url = base_url();
    let email = unique_email();

    let resp = client
        .post(format!("{base_url}/api/auth/signup"))
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "passwordConfirm": TEST_PASSWORD,
            "username": "Integration",
        }))
        .send()
        .await
        .expect("Failed to sign up");
    assert!(resp.status().is_success(), "signup failed: {}", resp.status());

    let resp = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to log in");
    assert!(resp.status().is_success(), "login failed: {}", resp.status());

    email
}

/// Read a response body as the `{success, data, message}` envelope.
pub async fn envelope(resp: reqwest::Response) -> Value {
    let body: Value = resp.json().await.expect("Failed to parse response JSON");
    assert!(body.get("success").is_some(), "missing envelope: {body}");
    body
}
