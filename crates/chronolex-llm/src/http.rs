//! HTTP classification provider.
//!
//! Posts one non-streaming messages request per run and parses the
//! model's reply as a strict JSON array of `{index, taskCode,
//! confidence}` tuples. The whole call sits under a bounded
//! `tokio::time::timeout`; on expiry the request is abandoned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{
    Classification, ClassificationProvider, ClassifyError, ClassifyResult, SessionDigest,
};

/// API version header value expected by the messages endpoint.
const API_VERSION: &str = "2023-06-01";

/// Configuration for the HTTP classifier.
#[derive(Clone, Debug)]
pub struct HttpClassifierConfig {
    /// Base URL of the messages API.
    pub base_url: String,
    /// API key; `None` leaves the provider unconfigured.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Request deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HttpClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: None,
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_ms: 20_000,
        }
    }
}

/// Classification provider backed by a messages-style HTTP API.
pub struct HttpClassifier {
    config: HttpClassifierConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl HttpClassifier {
    /// Create a classifier from its configuration.
    #[must_use]
    pub fn new(config: HttpClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("chronolex/0.1")
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn send_request(&self, prompt: String) -> ClassifyResult<String> {
        let Some(api_key) = &self.config.api_key else {
            return Err(ClassifyError::NotConfigured);
        };
        let base = self.config.base_url.trim_end_matches('/');
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: 2048,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post(format!("{base}/v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| ClassifyError::MalformedResponse {
                    message: format!("unreadable response body: {e}"),
                })?;
        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| ClassifyError::MalformedResponse {
                message: "no text content block in response".into(),
            })
    }
}

/// Build the single batched classification prompt.
fn classification_prompt(sessions: &[SessionDigest], allowed_codes: &[&str]) -> String {
    let mut prompt = String::from(
        "Classify each work session below into exactly one task code. \
         Respond with ONLY a JSON array of objects shaped \
         {\"index\": <number>, \"taskCode\": <string>, \"confidence\": <0..1>}.\n\
         Allowed task codes: ",
    );
    prompt.push_str(&allowed_codes.join(", "));
    prompt.push_str("\n\nSessions:\n");
    for session in sessions {
        prompt.push_str(&format!("{}: {}\n", session.index, session.text));
    }
    prompt
}

/// Strip an optional Markdown code fence around the model's JSON.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse and validate the model's reply.
///
/// Rejects out-of-range indices and codes outside the allowed set —
/// a schema violation falls back to the heuristic tier, it never
/// half-applies.
fn parse_classifications(
    text: &str,
    session_count: usize,
    allowed_codes: &[&str],
) -> ClassifyResult<Vec<Classification>> {
    let parsed: Vec<Classification> =
        serde_json::from_str(strip_code_fence(text)).map_err(|e| {
            ClassifyError::MalformedResponse {
                message: format!("reply is not a classification array: {e}"),
            }
        })?;
    for item in &parsed {
        if item.index >= session_count {
            return Err(ClassifyError::MalformedResponse {
                message: format!("index {} out of range (batch of {session_count})", item.index),
            });
        }
        if !allowed_codes.contains(&item.task_code.as_str()) {
            return Err(ClassifyError::MalformedResponse {
                message: format!("task code {:?} not in allowed set", item.task_code),
            });
        }
    }
    Ok(parsed)
}

#[async_trait]
impl ClassificationProvider for HttpClassifier {
    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn classify_batch(
        &self,
        sessions: &[SessionDigest],
        allowed_codes: &[&str],
    ) -> ClassifyResult<Vec<Classification>> {
        if sessions.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = classification_prompt(sessions, allowed_codes);
        let timeout = std::time::Duration::from_millis(self.config.timeout_ms);
        let text = tokio::time::timeout(timeout, self.send_request(prompt))
            .await
            .map_err(|_| ClassifyError::Timeout {
                timeout_ms: self.config.timeout_ms,
            })??;
        debug!(sessions = sessions.len(), "classification reply received");
        parse_classifications(&text, sessions.len(), allowed_codes)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
