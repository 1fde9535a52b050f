use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::LlmConfig;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(String),
    #[error("LLM response violated the JSON contract: {0}")]
    Contract(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// Gateway to the language model. Callers always request strict JSON and run
/// the raw response through [`strip_code_fences`] before parsing.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError>;

    /// Text + image input for vision models. `image_base64` must be raw
    /// base64 without a data-URL prefix.
    async fn complete_with_image(
        &self,
        prompt: &str,
        image_base64: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    async fn chat(&self, messages: Value, max_tokens: u32) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": max_tokens,
                "response_format": {"type": "json_object"}
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http(format!("status {status}: {body}")));
        }

        let result: Value = response.json().await?;
        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::Contract("response has no message content".to_string()))?;
        Ok(content.to_string())
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": user_prompt}));
        self.chat(Value::Array(messages), max_tokens).await
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image_base64: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let messages = json!([{
            "role": "user",
            "content": [
                {"type": "text", "text": prompt},
                {
                    "type": "image_url",
                    "image_url": {"url": format!("data:image/jpeg;base64,{image_base64}")}
                }
            ]
        }]);
        self.chat(messages, max_tokens).await
    }
}

/// Strips markdown code fences from a raw LLM response. Models sometimes wrap
/// JSON in ```json ... ``` despite being told not to.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };
    without_open
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or_else(|| without_open.trim())
}
