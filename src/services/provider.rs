use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates test questions. Return questions in JSON format.";

/// Sampling parameters forwarded verbatim to the provider.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.ai_model.clone(),
            temperature: config.ai_temperature,
            max_tokens: config.ai_max_tokens,
        }
    }
}

/// The one external collaborator of the authoring core: turn a prompt into
/// free-form response text, or fail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Groq chat-completions client (OpenAI-compatible endpoint).
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.ai_request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.groq_api_key.clone(),
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextGeneration for GroqClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let payload = serde_json::json!({
            "model": config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": config.temperature,
            "max_tokens": config.max_tokens
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "AI provider error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Transport("AI provider response carried no text".to_string()))
    }
}
