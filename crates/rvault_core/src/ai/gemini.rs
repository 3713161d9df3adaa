//! Gemini `generateContent` adapter.
//!
//! # Invariants
//! - The API key travels only in the `x-goog-api-key` header, never in the
//!   URL, so transport errors and logs cannot carry it.
//! - Missing credentials fail at call time, not at construction.

use super::completion::{AiError, TextCompletion};
use crate::config::AiConfig;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;

const API_KEY_HEADER: &str = "x-goog-api-key";
const RESPONSE_TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";
const MAX_ERROR_BODY_CHARS: usize = 300;

/// HTTP client for Google's generative language API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &AiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::MissingApiKey)?;
        let started_at = Instant::now();
        let url = build_request_url(&self.base_url, &self.model);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&build_request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "event=ai_complete module=ai status=error provider=gemini model={} http_status={} duration_ms={}",
                self.model,
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(AiError::Provider {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let payload: Value = response.json().await?;
        let text = extract_text(&payload)?;
        info!(
            "event=ai_complete module=ai status=ok provider=gemini model={} duration_ms={} chars={}",
            self.model,
            started_at.elapsed().as_millis(),
            text.chars().count()
        );
        Ok(text)
    }
}

fn build_request_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn build_request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [{ "text": prompt }] }
        ]
    })
}

/// Pulls the first candidate's text out of a `generateContent` response.
///
/// A response with candidates but no text part is treated as an empty
/// completion; one without any candidates is invalid.
fn extract_text(payload: &Value) -> Result<String, AiError> {
    if let Some(text) = payload.pointer(RESPONSE_TEXT_POINTER).and_then(Value::as_str) {
        return Ok(text.to_string());
    }
    match payload.get("candidates").and_then(Value::as_array) {
        Some(candidates) if !candidates.is_empty() => Ok(String::new()),
        _ => Err(AiError::InvalidResponse(
            "response has no candidates".to_string(),
        )),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{build_request_body, build_request_url, extract_text, GeminiClient};
    use crate::ai::completion::{AiError, TextCompletion};
    use crate::config::AiConfig;
    use serde_json::json;

    #[test]
    fn request_url_strips_trailing_slash() {
        let url = build_request_url("https://example.test/", "gemini-2.5-flash");
        assert_eq!(
            url,
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_wraps_prompt_as_single_user_part() {
        let body = build_request_body("hello");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn extract_text_reads_first_candidate() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "done" }] } }]
        });
        assert_eq!(extract_text(&payload).unwrap(), "done");
    }

    #[test]
    fn extract_text_handles_missing_parts_and_missing_candidates() {
        let no_parts = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert_eq!(extract_text(&no_parts).unwrap(), "");

        let no_candidates = json!({ "promptFeedback": {} });
        assert!(matches!(
            extract_text(&no_candidates),
            Err(AiError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let config = AiConfig {
            api_key: None,
            ..AiConfig::default()
        };
        let client = GeminiClient::new(&config);
        let err = client.complete("anything").await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }

    #[tokio::test]
    async fn transport_errors_do_not_carry_the_api_key() {
        let config = AiConfig {
            api_key: Some("SECRET-KEY-123".to_string()),
            model: "m".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
        };
        let client = GeminiClient::new(&config);
        let err = client.complete("x").await.unwrap_err();
        assert!(matches!(err, AiError::Transport(_)));
        let shown = format!("{err} {err:?}");
        assert!(!shown.contains("SECRET-KEY-123"), "{shown}");
    }
}
