//! Transports carry one prompt to the remote chat service and bring back its reply.
//!
//! The wire contract is small: send `{prompt, options: {model}}`, receive either
//! `{content}` or an error string. HTTP transports answer inline; message-passing
//! transports (an embedded script runtime, a socket) may answer later through
//! [`AiBridge::deliver`](super::AiBridge::deliver).

use super::{ModelOptions, QueryId};
use crate::error::AiError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

const SYSTEM_PROMPT: &str = "You are a warm, practical emotional-resilience coach. \
    Keep answers concise and supportive. When asked for JSON, reply with JSON only.";

/// One outbound request as seen by a transport.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub query_id: QueryId,
    pub prompt: String,
    pub options: ModelOptions,
}

/// What the remote side sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Content(String),
    Error(String),
}

impl ChatReply {
    /// Interprets a raw wire message: `{"content": ..}`, `{"error": ..}` or a bare error string.
    pub fn from_wire(value: &serde_json::Value) -> Self {
        if let Some(content) = value.get("content").and_then(|v| v.as_str()) {
            return ChatReply::Content(content.to_string());
        }
        if let Some(err) = value.get("error") {
            let msg = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return ChatReply::Error(msg);
        }
        match value.as_str() {
            Some(s) => ChatReply::Error(s.to_string()),
            None => ChatReply::Error(format!("unrecognised reply: {}", value)),
        }
    }

    pub fn into_result(self) -> Result<String, AiError> {
        match self {
            ChatReply::Content(c) => Ok(c),
            ChatReply::Error(e) => Err(AiError::RequestFailed(e)),
        }
    }
}

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Resolves once the remote runtime can accept requests.
    async fn ready(&self) -> Result<(), AiError>;

    /// Sends one request. `Ok(None)` means the reply will arrive out of band.
    async fn send(&self, request: ChatRequest) -> Result<Option<ChatReply>, AiError>;
}

// OpenAI-compatible request/response for OpenRouter
#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessageResponse,
}

#[derive(Deserialize)]
struct CompletionMessageResponse {
    content: String,
}

/// HTTP transport for any OpenAI-compatible `/chat/completions` endpoint (OpenRouter by default).
pub struct OpenRouterTransport {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
}

impl OpenRouterTransport {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.into().trim().to_string(),
            api_base: OPENROUTER_API_BASE.to_string(),
            client,
        }
    }

    /// Point at another OpenAI-compatible base URL (local proxy, self-hosted model).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl ChatTransport for OpenRouterTransport {
    async fn ready(&self) -> Result<(), AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::request_failed("no API key configured"));
        }
        Ok(())
    }

    async fn send(&self, request: ChatRequest) -> Result<Option<ChatReply>, AiError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = CompletionRequest {
            model: request.options.model.clone(),
            messages: vec![
                CompletionMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                CompletionMessage {
                    role: "user".to_string(),
                    content: request.prompt,
                },
            ],
            temperature: Some(0.7),
            max_tokens: Some(1024),
        };

        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", "ResilientMe")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::request_failed(format!("chat request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Ok(Some(ChatReply::Error(format!("API error {}: {}", status, body))));
        }

        let parsed: CompletionResponse = res
            .json()
            .await
            .map_err(|e| AiError::request_failed(format!("chat response parse failed: {}", e)))?;

        let reply = match parsed.choices.into_iter().next() {
            Some(choice) => ChatReply::Content(choice.message.content),
            None => ChatReply::Error("empty response from chat service".to_string()),
        };
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_reply_shapes() {
        assert_eq!(
            ChatReply::from_wire(&json!({"content": "hi"})),
            ChatReply::Content("hi".to_string())
        );
        assert_eq!(
            ChatReply::from_wire(&json!({"error": "quota"})),
            ChatReply::Error("quota".to_string())
        );
        assert_eq!(
            ChatReply::from_wire(&json!("boom")),
            ChatReply::Error("boom".to_string())
        );
    }

    #[tokio::test]
    async fn missing_key_is_not_ready() {
        let transport = OpenRouterTransport::new("   ");
        assert!(transport.ready().await.is_err());
    }
}
