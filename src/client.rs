use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmProvider, LlmSettings};

/// Chat-completions transport shared by every crew role.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}

pub type DynLlmClient = dyn LlmClient;

/// Builds the process-wide client from LLM settings.
pub trait LlmClientFactory {
    fn build(&self, settings: &LlmSettings) -> Result<Arc<DynLlmClient>>;
}

pub struct HttpClientFactory;

impl LlmClientFactory for HttpClientFactory {
    fn build(&self, settings: &LlmSettings) -> Result<Arc<DynLlmClient>> {
        Ok(Arc::new(AIClient::new(settings)?))
    }
}

/// OpenAI-compatible chat-completions client (OpenRouter, OpenAI, Ollama).
#[derive(Debug, Clone)]
pub struct AIClient {
    http: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
    provider: LlmProvider,
}

impl AIClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            user_agent: settings.user_agent.clone(),
            provider: settings.provider,
        })
    }
}

#[async_trait]
impl LlmClient for AIClient {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            provider = %self.provider,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let mut req_builder = self
            .http
            .post(&url)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/json")
            .json(&request);

        if !self.api_key.is_empty() {
            req_builder = req_builder.bearer_auth(&self.api_key);
        }

        if matches!(self.provider, LlmProvider::OpenRouter) {
            req_builder = req_builder.header("X-Title", "crewflow");
        }

        let response = req_builder
            .send()
            .await
            .context("Failed to send request to chat completions endpoint")?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let body = response
                    .json::<ChatCompletionResponse>()
                    .await
                    .context("Failed to parse chat completion response JSON")?;
                debug!(choices = body.choices.len(), "chat completion received");
                Ok(body)
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let error_text = response.text().await.unwrap_or_default();
                Err(anyhow!(
                    "Rate limit exceeded. Please wait before trying again. (API response: {})",
                    error_text
                ))
            }
            reqwest::StatusCode::UNAUTHORIZED => Err(anyhow!(
                "Invalid API key. Please check your {} API key configuration.",
                self.provider.display_name()
            )),
            reqwest::StatusCode::BAD_REQUEST => {
                let error_text = response.text().await.unwrap_or_default();
                Err(anyhow!("Invalid request: {}", error_text))
            }
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
            | reqwest::StatusCode::SERVICE_UNAVAILABLE => Err(anyhow!(
                "Service is temporarily unavailable. Please try again later."
            )),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(anyhow!("API error (status {}): {}", status, error_text))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatMessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatMessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatMessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}
