//! AI chat relay route handler.

use axum::extract::State;

use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::services::ai::{ChatReply, ChatRequest};
use crate::state::AppState;

/// Relay a conversation to the chat model. Always answers 200; failures
/// yield the fallback message.
///
/// # Route
///
/// `POST /api/ai/proxy`
pub async fn proxy(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResponse<ChatReply> {
    ApiResponse::ok(state.ai().reply(&request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use crate::services::ai::FALLBACK_MESSAGE;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn test_without_key_returns_fallback() {
        let app = Router::new()
            .nest("/api/ai", crate::routes::ai_routes())
            .with_state(test_state());

        let response = app
            .oneshot(
                Request::post("/api/ai/proxy")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"purpose":"support","messages":[{"role":"user","content":"Hi"}]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["content"], FALLBACK_MESSAGE);
    }
}
