//! AI chat relay (`OpenAI` chat completions).
//!
//! The relay never fails from the caller's point of view: any problem is
//! logged and answered with [`FALLBACK_MESSAGE`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::AiConfig;

/// Answer used whenever the model cannot be reached.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, the assistant is unavailable right now. Please try again later.";

const ALLOWED_ROLES: &[&str] = &["system", "user", "assistant"];
const SUPPORT_TEMPERATURE: f32 = 0.3;
const DEFAULT_TEMPERATURE: f32 = 0.6;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from the chat completion call. They never reach the client.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("no messages to send")]
    EmptyConversation,

    #[error("AI API key is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("response had no content")]
    EmptyResponse,

    #[error("parse error: {0}")]
    Parse(String),
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of `POST /api/ai/proxy`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Response of `POST /api/ai/proxy`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// AI chat relay client.
#[derive(Clone)]
pub struct AiClient {
    inner: Arc<AiClientInner>,
}

struct AiClientInner {
    client: reqwest::Client,
    api_url: String,
    model: String,
    authorization: Option<HeaderValue>,
}

impl AiClient {
    /// Create a new AI client.
    #[must_use]
    pub fn new(config: &AiConfig) -> Self {
        let authorization = config.api_key.as_ref().and_then(|key| {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {}", key.expose_secret())).ok()?;
            value.set_sensitive(true);
            Some(value)
        });

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(AiClientInner {
                client,
                api_url: config.api_url.clone(),
                model: config.model.clone(),
                authorization,
            }),
        }
    }

    /// Relay a conversation and return the model's answer, or the fallback
    /// message on any failure.
    pub async fn reply(&self, request: &ChatRequest) -> ChatReply {
        match self.complete(request).await {
            Ok(content) => ChatReply { content },
            Err(AiError::EmptyConversation) => ChatReply {
                content: FALLBACK_MESSAGE.to_owned(),
            },
            Err(e) => {
                tracing::warn!(error = %e, "AI relay fell back");
                ChatReply {
                    content: FALLBACK_MESSAGE.to_owned(),
                }
            }
        }
    }

    /// Call the chat completion endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when there is nothing to send, no key, a transport
    /// failure, a non-2xx status or an answer without content.
    #[instrument(skip(self, request), fields(model = %self.inner.model))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, AiError> {
        let messages = sanitize_messages(&request.messages);
        if messages.is_empty() {
            return Err(AiError::EmptyConversation);
        }
        let authorization = self
            .inner
            .authorization
            .clone()
            .ok_or(AiError::NotConfigured)?;

        let body = CompletionRequest {
            model: &self.inner.model,
            messages: &messages,
            temperature: temperature_for(request.purpose.as_deref()),
        };

        let response = self
            .inner
            .client
            .post(format!("{}/v1/chat/completions", self.inner.api_url))
            .header(AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

/// Sampling temperature: steadier answers for customer support.
fn temperature_for(purpose: Option<&str>) -> f32 {
    match purpose {
        Some(p) if p.trim().eq_ignore_ascii_case("support") => SUPPORT_TEMPERATURE,
        _ => DEFAULT_TEMPERATURE,
    }
}

/// Lowercase roles and drop messages with unknown roles or no content.
fn sanitize_messages(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter_map(|m| {
            let role = m.role.trim().to_ascii_lowercase();
            (ALLOWED_ROLES.contains(&role.as_str()) && !m.content.trim().is_empty()).then(|| {
                ChatMessage {
                    role,
                    content: m.content.clone(),
                }
            })
        })
        .collect()
}
