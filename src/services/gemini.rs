use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::Settings;
use crate::services::retrieval::content_preview;

const TOP_K: u32 = 40;
const TOP_P: f64 = 0.95;
const EMPTY_OBJECT: &str = "{}";
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub(crate) enum GenerationError {
    #[error("LLM upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("LLM request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("LLM response is not valid JSON: {0}")]
    MalformedUpstreamResponse(String),
}

/// Text-in, text-out LLM backend used by the generation pipeline.
#[async_trait]
pub(crate) trait TaskGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Client for the Gemini `models/{model}:generateContent` endpoint.
#[derive(Debug, Clone)]
pub(crate) struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: u32,
    temperature: f64,
}

impl GeminiClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let gemini = settings.gemini();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(gemini.request_timeout_seconds))
            .build()
            .context("Failed to build Gemini HTTP client")?;

        if gemini.api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY is empty; task generation requests will be rejected");
        }

        Ok(Self {
            client,
            api_key: gemini.api_key.clone(),
            base_url: gemini.base_url.trim_end_matches('/').to_string(),
            model: gemini.model.clone(),
            max_output_tokens: gemini.max_output_tokens,
            temperature: gemini.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": TOP_K,
                "topP": TOP_P,
                "maxOutputTokens": self.max_output_tokens,
            }
        })
    }
}

#[async_trait]
impl TaskGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let timer = Instant::now();
        tracing::info!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.payload(prompt))
            .send()
            .await
            .map_err(GenerationError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(GenerationError::Transport)?;
        let elapsed = timer.elapsed().as_secs_f64();
        metrics::histogram!("llm_request_duration_seconds").record(elapsed);

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                duration_seconds = elapsed,
                "Gemini returned an error status"
            );
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body: content_preview(&body, ERROR_BODY_LIMIT),
            });
        }

        tracing::info!(duration_seconds = elapsed, response_bytes = body.len(), "Gemini responded");
        parse_candidate_text(&body)
    }
}

/// Extracts the first emitted text of the first candidate.
///
/// A body that is not JSON is an error. A well-formed response without text (no
/// candidates, or a thinking-only candidate without parts) degrades to `"{}"`.
pub(crate) fn parse_candidate_text(body: &str) -> Result<String, GenerationError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| GenerationError::MalformedUpstreamResponse(err.to_string()))?;

    let Some(candidate) =
        value.get("candidates").and_then(Value::as_array).and_then(|items| items.first())
    else {
        tracing::warn!("Gemini response has no candidates");
        return Ok(EMPTY_OBJECT.to_string());
    };

    let Some(parts) = candidate.pointer("/content/parts").and_then(Value::as_array) else {
        let finish_reason = candidate.get("finishReason").and_then(Value::as_str).unwrap_or("");
        tracing::warn!(finish_reason, "Gemini candidate has no content parts");
        return Ok(EMPTY_OBJECT.to_string());
    };

    let text = parts
        .iter()
        .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .find_map(|part| part.get("text").and_then(Value::as_str));

    match text {
        Some(text) => Ok(text.to_string()),
        None => {
            tracing::warn!("Gemini candidate parts carry no text");
            Ok(EMPTY_OBJECT.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_part() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"tasks\":[]}"}]}}]}"#;
        assert_eq!(parse_candidate_text(body).expect("text"), r#"{"tasks":[]}"#);
    }

    #[test]
    fn skips_thought_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"thinking...","thought":true},
            {"text":"{\"tasks\":[1]}"}
        ]}}]}"#;
        assert_eq!(parse_candidate_text(body).expect("text"), r#"{"tasks":[1]}"#);
    }

    #[test]
    fn degrades_to_empty_object_without_text() {
        for body in [
            r#"{"candidates":[]}"#,
            r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#,
            r#"{"candidates":[{"content":{"role":"model"},"finishReason":"MAX_TOKENS"}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{}}]}}]}"#,
        ] {
            assert_eq!(parse_candidate_text(body).expect("degraded"), "{}", "body {body}");
        }
    }

    #[test]
    fn rejects_non_json_body() {
        let result = parse_candidate_text("<html>Bad Gateway</html>");
        assert!(matches!(result, Err(GenerationError::MalformedUpstreamResponse(_))));
    }

    #[test]
    fn payload_matches_generate_content_shape() {
        let client = GeminiClient {
            client: Client::new(),
            api_key: "key".to_string(),
            base_url: "https://example.test/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: 2048,
            temperature: 0.7,
        };

        let payload = client.payload("Wygeneruj");

        assert_eq!(payload["contents"][0]["parts"][0]["text"], "Wygeneruj");
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(payload["generationConfig"]["topK"], 40);
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
