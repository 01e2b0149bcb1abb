//! Generation client implementations.
//!
//! - **[`DisabledGenerator`]**: fails every call.
//! - **[`OpenAIGenerator`]**: `POST /v1/chat/completions` with a single user message.
//! - **[`OllamaGenerator`]**: `POST /api/generate` with streaming off.
//!
//! Sampling parameters are passed through unchanged from the calling stage.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::http::{build_client, openai_api_key, post_json_with_retry};
use crate::traits::{GenerationClient, GenerationParams};

/// A generation client that always errors.
pub struct DisabledGenerator;

#[async_trait]
impl GenerationClient for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str, _params: GenerationParams) -> Result<String> {
        bail!("Generation provider is disabled")
    }
}

// ============ OpenAI ============

pub struct OpenAIGenerator {
    model: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for OpenAI provider"))?;

        Ok(Self {
            model,
            api_key: openai_api_key()?,
            max_retries: config.max_retries,
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        let json = post_json_with_retry(
            &self.client,
            "https://api.openai.com/v1/chat/completions",
            Some(&self.api_key),
            &body,
            self.max_retries,
            "OpenAI API",
        )
        .await?;
        parse_chat_response(&json)
    }
}

/// Extracts `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

// ============ Ollama ============

pub struct OllamaGenerator {
    model: String,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            model,
            url,
            max_retries: config.max_retries,
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl GenerationClient for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_predict": params.max_tokens,
                "temperature": params.temperature,
            },
        });
        let json = post_json_with_retry(
            &self.client,
            &format!("{}/api/generate", self.url),
            None,
            &body,
            self.max_retries,
            "Ollama API",
        )
        .await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
    }
}

pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn GenerationClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledGenerator)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
