//! Integration tests for board posts and their comments.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The API server running (cargo run -p modish-api)

use modish_integration_tests::{base_url, cookie_client, envelope, signup_and_login, unique_tag};
use reqwest::multipart::Form;
use reqwest::{Client, StatusCode};
use serde_json::json;

/// Write a post and return its number.
async fn write_post(client: &Client, title: &str, secret: bool) -> i64 {
    let form = Form::new()
        .text("boardCategory", "FREE")
        .text("title", title.to_owned())
        .text("content", "Written by the integration tests")
        .text("secretYn", if secret { "Y" } else { "N" });
    let resp = client
        .post(format!("{}/api/board/write", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("Failed to write post");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = envelope(resp).await;
    body["data"]["board_no"].as_i64().expect("board number")
}

async fn comment(client: &Client, board_no: i64, text: &str) -> StatusCode {
    client
        .post(format!("{}/api/comments/board/{board_no}", base_url()))
        .json(&json!({ "co_comment": text }))
        .send()
        .await
        .expect("Failed to comment")
        .status()
}

/// Post numbers listed for a keyword.
async fn listed(client: &Client, keyword: &str) -> Vec<i64> {
    let resp = client
        .get(format!("{}/api/board/list", base_url()))
        .query(&[("keyword", keyword)])
        .send()
        .await
        .expect("Failed to list posts");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = envelope(resp).await;
    body["data"]["list"]
        .as_array()
        .expect("post list")
        .iter()
        .filter_map(|p| p["board_no"].as_i64())
        .collect()
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_deleted_post_disappears_everywhere() {
    let client = cookie_client();
    let base_url = base_url();
    signup_and_login(&client).await;

    let tag = unique_tag();
    let board_no = write_post(&client, &tag, false).await;
    assert_eq!(comment(&client, board_no, "First!").await, StatusCode::OK);
    assert_eq!(listed(&client, &tag).await, vec![board_no]);

    let resp = client
        .get(format!("{base_url}/api/comments/board/{board_no}"))
        .send()
        .await
        .expect("Failed to list comments");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = envelope(resp).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let resp = client
        .delete(format!("{base_url}/api/board/{board_no}"))
        .send()
        .await
        .expect("Failed to delete post");
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(listed(&client, &tag).await.is_empty());

    let resp = client
        .get(format!("{base_url}/api/board/{board_no}"))
        .send()
        .await
        .expect("Failed to get post");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .get(format!("{base_url}/api/comments/board/{board_no}"))
        .send()
        .await
        .expect("Failed to list comments");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(comment(&client, board_no, "Too late").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_secret_post_comments_need_reader() {
    let writer = cookie_client();
    let base_url = base_url();
    signup_and_login(&writer).await;
    let board_no = write_post(&writer, &unique_tag(), true).await;

    let path = format!("{base_url}/api/comments/board/{board_no}");

    let resp = cookie_client()
        .get(&path)
        .send()
        .await
        .expect("Failed to list comments");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let other = cookie_client();
    signup_and_login(&other).await;
    let resp = other
        .get(&path)
        .send()
        .await
        .expect("Failed to list comments");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = writer
        .get(&path)
        .send()
        .await
        .expect("Failed to list comments");
    assert_eq!(resp.status(), StatusCode::OK);
}
