//! Remote generation backend for OpenAI-compatible chat APIs.
//!
//! [`RemoteGeneration`] translates normalized [`CompletionRequest`]s into
//! `/v1/chat/completions` calls (Groq, OpenAI, Together and compatibles)
//! and [`ImageRequest`]s into a `/v1/images/generations`-shaped call that
//! returns a hosted image URL.

use super::{Completion, CompletionRequest, GenerationService, ImageHandle, ImageRequest};
use crate::error::Result;
use crate::EngineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for hosted OpenAI-compatible providers.
///
/// Chat completions: `POST {base_url}/v1/chat/completions` with a
/// system + user message pair. Image synthesis:
/// `POST {base_url}/v1/images/generations`.
///
/// API keys are sent as `Authorization: Bearer {key}` when configured.
#[derive(Debug, Clone)]
pub struct RemoteGeneration {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl RemoteGeneration {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            model: model.into(),
            api_key: None,
        }
    }

    /// Set the API key sent as a bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_chat_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_message},
                {"role": "user", "content": request.prompt},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "stream": false,
        })
    }

    /// Parse a Retry-After header value as seconds.
    fn parse_retry_after(value: &str) -> Option<std::time::Duration> {
        value
            .trim()
            .parse::<u64>()
            .ok()
            .map(std::time::Duration::from_secs)
    }

    async fn send(&self, client: &Client, url: &str, body: &Value) -> Result<Value> {
        let mut req = client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(Self::parse_retry_after);
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::Provider {
                status,
                body: text,
                retry_after,
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl GenerationService for RemoteGeneration {
    async fn complete(&self, client: &Client, request: &CompletionRequest) -> Result<Completion> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_chat_body(request);
        let json_resp = self.send(client, &url, &body).await?;

        let text = json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Other("no choices in provider response".to_string()))?
            .trim()
            .to_string();

        Ok(Completion { text, status: 200 })
    }

    async fn synthesize(&self, client: &Client, request: &ImageRequest) -> Result<ImageHandle> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let body = json!({
            "prompt": request.prompt,
            "size": format!("{}x{}", request.width, request.height),
            "n": 1,
        });
        let json_resp = self.send(client, &url, &body).await?;

        let entry = json_resp
            .get("data")
            .and_then(|d| d.get(0))
            .ok_or_else(|| EngineError::Other("no image data in provider response".to_string()))?;

        let image_url = entry.get("url").and_then(|v| v.as_str()).map(String::from);
        let id = entry
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("img_{}", fastrand::u64(..)));

        Ok(ImageHandle {
            id,
            url: image_url,
            width: request.width,
            height: request.height,
        })
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Strip known provider path suffixes from a base URL so endpoint paths can
/// be appended without double-pathing.
/// e.g., "https://api.groq.com/openai/v1" -> "https://api.groq.com/openai"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    for suffix in &["/v1/chat/completions", "/v1/chat", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_strips_v1() {
        assert_eq!(
            normalize_base_url("https://api.groq.com/openai/v1"),
            "https://api.groq.com/openai"
        );
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1/"),
            "https://api.openai.com"
        );
    }

    #[test]
    fn test_normalize_base_url_preserves_clean() {
        assert_eq!(
            normalize_base_url("https://api.openai.com"),
            "https://api.openai.com"
        );
    }

    #[test]
    fn test_chat_body_shape() {
        let backend = RemoteGeneration::new("https://api.groq.com/openai", "llama3-8b-8192");
        let request = CompletionRequest::new("write an email", "you are a copywriter")
            .with_max_tokens(512)
            .with_temperature(0.4);
        let body = backend.build_chat_body(&request);
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "write an email");
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(
            RemoteGeneration::parse_retry_after("30"),
            Some(std::time::Duration::from_secs(30))
        );
        assert_eq!(RemoteGeneration::parse_retry_after("soon"), None);
    }
}
