use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// A message from the user
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// A system instruction
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Chat response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: None,
        }
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options
            .get_or_insert_with(GenerationOptions::default)
            .temperature = Some(temperature);
        self
    }

    /// Disable streaming
    pub fn no_stream(mut self) -> Self {
        self.stream = Some(false);
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a complete base URL
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder()
                .timeout(request_timeout)
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    /// Base URL the client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat with the Ollama API, retrying transient failures
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let mut attempt = 0;
        loop {
            match self.send_chat(&url, request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    let backoff = backoff_ms(self.backoff_base_ms, attempt);
                    warn!(
                        "Ollama request failed (attempt {}/{}): {}. Retrying in {}ms",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_chat(&self, url: &str, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        parse_chat_response(&response_text)
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

/// Exponential backoff for the given retry attempt, saturating instead of overflowing
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt))
}

/// Server-side and connection errors are worth retrying; client errors are not
fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_) => true,
        ProviderError::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
        ProviderError::ParseError(_) => false,
    }
}

/// Parse a chat reply, accepting either one JSON object or a JSONL stream
fn parse_chat_response(response_text: &str) -> Result<ChatResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<ChatResponse>(response_text) {
        return Ok(response);
    }

    // Streamed replies arrive as one JSON object per line; concatenate the pieces
    let mut content = String::new();
    let mut model = String::new();
    let mut done = false;
    let mut parsed_any = false;
    for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        parsed_any = true;
        if let Some(part) = value["message"]["content"].as_str() {
            content.push_str(part);
        }
        if let Some(name) = value["model"].as_str() {
            model = name.to_string();
        }
        done |= value["done"].as_bool().unwrap_or(false);
    }

    if !parsed_any {
        let preview: String = response_text.chars().take(500).collect();
        return Err(ProviderError::ParseError(format!(
            "Response contains invalid JSON: {}",
            preview
        )));
    }

    debug!("Reassembled streamed Ollama reply ({} chars)", content.len());
    Ok(ChatResponse {
        model,
        message: ChatMessage {
            role: "assistant".to_string(),
            content,
        },
        done,
        prompt_eval_count: None,
        eval_count: None,
    })
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.chat(&request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.message.content.clone()
    }
}
