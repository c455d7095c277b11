//! Remote completion capability: text in, text out.

use async_trait::async_trait;
use idea_validator_core::{ValidatorError, ValidatorResult};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::DaemonConfig;

/// Per-call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOptions {
    pub model: String,
    /// Lets the model search the web before answering.
    pub web_search: bool,
}

impl From<&DaemonConfig> for CompletionOptions {
    fn from(cfg: &DaemonConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            web_search: cfg.web_search,
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// False when no credential is available; no call should be attempted.
    fn is_configured(&self) -> bool;

    /// Sends `input` and returns the reply text. The reply is not guaranteed
    /// to be JSON.
    async fn complete(&self, input: &str, opts: &CompletionOptions) -> ValidatorResult<String>;
}

/// Client for the OpenAI Responses API.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn from_config(cfg: &DaemonConfig) -> Self {
        Self::new(cfg.openai_base_url.clone(), cfg.openai_api_key.clone())
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, input: &str, opts: &CompletionOptions) -> ValidatorResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ValidatorError::Configuration("OPENAI_API_KEY is not set".to_string())
        })?;

        let payload = request_body(input, opts);
        let url = format!("{}/responses", self.base_url);
        debug!(%url, model = %opts.model, web_search = opts.web_search, "sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ValidatorError::Generic(format!("request to model service failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ValidatorError::Generic(format!("model service reply is not JSON: {e}")))?;
        extract_output_text(&value)
            .ok_or_else(|| ValidatorError::Generic("empty model reply".to_string()))
    }
}

pub fn request_body(input: &str, opts: &CompletionOptions) -> Value {
    let mut body = json!({
        "model": opts.model,
        "input": input,
    });
    if opts.web_search {
        body["tools"] = json!([{ "type": "web_search_preview" }]);
    }
    body
}

/// Maps a non-2xx answer onto the error kinds callers can tell apart.
pub fn status_error(status: StatusCode, body: &str) -> ValidatorError {
    match status {
        StatusCode::UNAUTHORIZED => ValidatorError::AuthFailure,
        StatusCode::TOO_MANY_REQUESTS => ValidatorError::RateLimitExceeded,
        StatusCode::BAD_REQUEST => ValidatorError::RemoteRequest(service_message(body)),
        other => ValidatorError::Generic(format!(
            "model service answered {other}: {}",
            service_message(body)
        )),
    }
}

fn service_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Concatenates every `output_text` part of a Responses API reply. Tool-call
/// items (web search) carry no content and are skipped.
pub fn extract_output_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("output_text").and_then(Value::as_str) {
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }

    let mut text = String::new();
    for item in value.get("output")?.as_array()? {
        let Some(contents) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for content in contents {
            if content.get("type").and_then(Value::as_str) == Some("output_text") {
                if let Some(t) = content.get("text").and_then(Value::as_str) {
                    text.push_str(t);
                }
            }
        }
    }
    (!text.is_empty()).then_some(text)
}
