//! Integration tests for signup, login, token refresh and logout.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p modish-api)

use modish_integration_tests::{
    TEST_PASSWORD, base_url, cookie_client, envelope, signup_and_login, unique_email,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_health_endpoints() {
    let client = cookie_client();
    let base_url = base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to call health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to call readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_signup_login_me_logout() {
    let client = cookie_client();
    let base_url = base_url();
    let email = signup_and_login(&client).await;

    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = envelope(resp).await;
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["role"], "USER");

    let resp = client
        .post(format!("{base_url}/api/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = envelope(resp).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_signup_conflicts() {
    let client = cookie_client();
    let base_url = base_url();
    let email = signup_and_login(&client).await;

    let resp = client
        .post(format!("{base_url}/api/auth/signup"))
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "passwordConfirm": TEST_PASSWORD,
            "username": "Again",
        }))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .get(format!("{base_url}/api/auth/check-email"))
        .query(&[("email", email.as_str())])
        .send()
        .await
        .expect("Failed to check email");
    let body = envelope(resp).await;
    assert_eq!(body["data"], false);

    let resp = client
        .get(format!("{base_url}/api/auth/check-email"))
        .query(&[("email", unique_email())])
        .send()
        .await
        .expect("Failed to check email");
    let body = envelope(resp).await;
    assert_eq!(body["data"], true);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_is_unauthorized() {
    let client = cookie_client();
    let base_url = base_url();
    let email = signup_and_login(&client).await;

    let resp = cookie_client()
        .post(format!("{base_url}/api/auth/login"))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_refresh_issues_new_access_token() {
    let client = cookie_client();
    let base_url = base_url();
    signup_and_login(&client).await;

    let resp = client
        .post(format!("{base_url}/api/auth/refresh"))
        .send()
        .await
        .expect("Failed to refresh");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = envelope(resp).await;
    assert!(body["data"]["accessToken"].is_string());

    let resp = cookie_client()
        .post(format!("{base_url}/api/auth/refresh"))
        .send()
        .await
        .expect("Failed to refresh");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
