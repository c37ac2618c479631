use crate::adapters::{build_client, endpoint, ensure_success};
use crate::config::toml_config::{HttpConfig, OpenAiConfig};
use crate::domain::model::{ChatMessage, ChatRequest};
use crate::domain::ports::{ChatProvider, EmbeddingProvider};
use crate::utils::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "OpenAI";

/// OpenAI 相容的 embeddings 與 chat completions 客戶端
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, http: &HttpConfig) -> Result<Self> {
        let client = build_client(Duration::from_secs(config.timeout_seconds), &http.user_agent)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AdvisorError::MissingCredential {
                feature: SERVICE.to_string(),
                variable: "OPENAI_API_KEY".to_string(),
            })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = self.api_key()?;
        tracing::debug!("Embedding {} chars with {}", text.len(), self.embedding_model);

        let response = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .bearer_auth(key)
            .json(&EmbeddingRequest {
                model: &self.embedding_model,
                input: text,
            })
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AdvisorError::ProcessingError {
                message: "embedding response contained no vectors".to_string(),
            })
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let key = self.api_key()?;
        tracing::debug!(
            "Chat completion with {} ({} messages, json_mode={})",
            self.chat_model,
            request.messages.len(),
            request.json_mode
        );

        let payload = CompletionRequest {
            model: &self.chat_model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;

        let body: CompletionResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AdvisorError::ProcessingError {
                message: "chat completion returned no content".to_string(),
            })
    }
}

/// Parses a JSON-mode completion, tolerating a fenced ```json block.
pub fn parse_json_reply<T: serde::de::DeserializeOwned>(reply: &str) -> Result<T> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}
