//! Integration tests for the address book and its single default.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p modish-api)

use modish_integration_tests::{base_url, cookie_client, envelope, signup_and_login};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn create_address(client: &Client, name: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/address", base_url()))
        .json(&json!({
            "addrName": name,
            "receiverName": "Integration",
            "receiverPhone": "010-0000-0000",
            "zipcode": "04524",
            "address": "1 Main St",
        }))
        .send()
        .await
        .expect("Failed to create address")
}

async fn address_ids(client: &Client, count: usize) -> Vec<i64> {
    let mut ids = Vec::with_capacity(count);
    for n in 0..count {
        let resp = create_address(client, &format!("Address {n}")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = envelope(resp).await;
        ids.push(body["data"]["addrNo"].as_i64().expect("address id"));
    }
    ids
}

async fn addresses(client: &Client) -> Vec<Value> {
    let resp = client
        .get(format!("{}/api/address", base_url()))
        .send()
        .await
        .expect("Failed to list addresses");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = envelope(resp).await;
    body["data"].as_array().cloned().expect("address array")
}

/// Ids of the addresses flagged as default.
async fn defaults(client: &Client) -> Vec<i64> {
    addresses(client)
        .await
        .iter()
        .filter(|a| a["isDefault"] == true)
        .filter_map(|a| a["addrNo"].as_i64())
        .collect()
}

async fn set_default(client: &Client, id: i64) -> StatusCode {
    client
        .put(format!("{}/api/address/{id}/default", base_url()))
        .send()
        .await
        .expect("Failed to set default")
        .status()
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_single_default_through_lifecycle() {
    let client = cookie_client();
    signup_and_login(&client).await;

    let ids = address_ids(&client, 3).await;
    assert_eq!(defaults(&client).await, vec![ids[0]]);

    assert_eq!(set_default(&client, ids[1]).await, StatusCode::OK);
    assert_eq!(defaults(&client).await, vec![ids[1]]);

    let resp = client
        .delete(format!("{}/api/address/{}", base_url(), ids[1]))
        .send()
        .await
        .expect("Failed to delete address");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(addresses(&client).await.len(), 2);
    assert_eq!(defaults(&client).await.len(), 1);

    assert_eq!(create_address(&client, "Third").await.status(), StatusCode::OK);
    assert_eq!(defaults(&client).await.len(), 1);

    let resp = create_address(&client, "One too many").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(addresses(&client).await.len(), 3);
    assert_eq!(defaults(&client).await.len(), 1);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_concurrent_default_switches_keep_one_default() {
    let client = cookie_client();
    signup_and_login(&client).await;
    let ids = address_ids(&client, 3).await;

    for _ in 0..5 {
        let (a, b) = tokio::join!(set_default(&client, ids[1]), set_default(&client, ids[2]));
        assert_eq!(a, StatusCode::OK);
        assert_eq!(b, StatusCode::OK);

        let current = defaults(&client).await;
        assert_eq!(current.len(), 1, "defaults: {current:?}");
        assert!(current[0] == ids[1] || current[0] == ids[2]);
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_other_users_address_is_forbidden() {
    let owner = cookie_client();
    signup_and_login(&owner).await;
    let ids = address_ids(&owner, 1).await;

    let other = cookie_client();
    signup_and_login(&other).await;
    assert_eq!(set_default(&other, ids[0]).await, StatusCode::FORBIDDEN);
    assert_eq!(defaults(&owner).await, vec![ids[0]]);
}
