//! Language model client
//!
//! The conversation loop only needs "prompt in, reply out"; [`ModelClient`]
//! is that seam. [`OllamaClient`] talks to an Ollama-compatible `/api/chat`
//! endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::{Error, Result};

/// Sends a prompt to a language model and returns its reply
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete a single prompt
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or an unusable response
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_ctx: u32,
    repeat_penalty: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Deserialize)]
struct TagsModel {
    name: String,
}

/// Client for an Ollama chat endpoint
pub struct OllamaClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl OllamaClient {
    /// Create a client with the configured request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// List models installed on the server
    ///
    /// Uses `/api/tags` on the same host as the chat endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the server is unreachable or answers with an error
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let mut url = reqwest::Url::parse(&self.config.url)
            .map_err(|e| Error::Config(format!("invalid model url {}: {e}", self.config.url)))?;
        url.set_path("/api/tags");
        url.set_query(None);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("model server error {status}: {body}")));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            model = %self.config.name,
            prompt_chars = prompt.len(),
            "sending prompt"
        );

        let request = ChatRequest {
            model: &self.config.name,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                num_ctx: self.config.num_ctx,
                repeat_penalty: self.config.repeat_penalty,
            },
        };

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "model request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "model API error");
            return Err(Error::Model(format!("model API error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse model response");
            e
        })?;

        tracing::info!(reply_chars = result.message.content.len(), "model reply received");
        Ok(result.message.content)
    }
}
