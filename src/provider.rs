//! Model Provider Abstraction
//!
//! Unified interface for the language-model backends a profile can select.
//! Backend kinds form a closed set ([`ProviderType`]); each kind carries its own
//! configuration in [`ModelProvider`], and a [`ProviderClientResolver`] turns
//! that configuration into a live [`ModelProviderClient`].

use crate::error::PrompterError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;

/// Closed set of backend kinds a profile may select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAI => "openai",
        }
    }

    /// Infer the backend kind from a free-text model name.
    ///
    /// `gemini-1.5-flash` selects Gemini, `gpt-4o-mini` selects OpenAI. Anything
    /// else is an unknown model and can never be dispatched.
    pub fn infer_from_model(model: &str) -> Result<Self, PrompterError> {
        let lowered = model.to_ascii_lowercase();
        if lowered.contains("gemini") {
            Ok(ProviderType::Gemini)
        } else if lowered.contains("gpt") {
            Ok(ProviderType::OpenAI)
        } else {
            Err(PrompterError::UnknownModel(model.to_string()))
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = PrompterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(ProviderType::Gemini),
            "openai" => Ok(ProviderType::OpenAI),
            other => Err(PrompterError::UnknownProviderType(other.to_string())),
        }
    }
}

/// Model provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelProvider {
    Gemini {
        model: String,
        api_key: String,
        base_url: Option<String>, // Default: https://generativelanguage.googleapis.com/v1beta
        embedding_model: Option<String>,
    },
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>, // For OpenAI-compatible endpoints
        embedding_model: Option<String>,
    },
}

impl ModelProvider {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ModelProvider::Gemini { .. } => ProviderType::Gemini,
            ModelProvider::OpenAI { .. } => ProviderType::OpenAI,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ModelProvider::Gemini { model, .. } | ModelProvider::OpenAI { model, .. } => model,
        }
    }
}

/// Per-kind provider settings as they appear in configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; falls back to `GEMINI_API_KEY` / `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override for the provider base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model used for example relevance embeddings
    #[serde(default)]
    pub embedding_model: Option<String>,

    /// Default completion options for every request
    #[serde(default)]
    pub default_options: CompletionOptions,
}

impl ProviderConfig {
    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(provider_type: ProviderType) -> &'static str {
        match provider_type {
            ProviderType::Gemini => "GEMINI_API_KEY",
            ProviderType::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Validate provider settings
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("Invalid base_url '{}': must be http(s)", url));
            }
        }
        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("Temperature {} out of range 0.0-2.0", temperature));
            }
        }
        Ok(())
    }

    /// Build the tagged provider for a given kind and model name.
    pub fn to_model_provider(
        &self,
        provider_type: ProviderType,
        model: &str,
    ) -> Result<ModelProvider, PrompterError> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => std::env::var(Self::api_key_env(provider_type)).map_err(|_| {
                PrompterError::ProviderNotConfigured(format!(
                    "{} requires an api_key or {}",
                    provider_type,
                    Self::api_key_env(provider_type)
                ))
            })?,
        };

        Ok(match provider_type {
            ProviderType::Gemini => ModelProvider::Gemini {
                model: model.to_string(),
                api_key,
                base_url: self.base_url.clone(),
                embedding_model: self.embedding_model.clone(),
            },
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model: model.to_string(),
                api_key,
                base_url: self.base_url.clone(),
                embedding_model: self.embedding_model.clone(),
            },
        })
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message; also the unit of a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,  // 0.0-2.0, default: 1.0
    pub max_tokens: Option<u32>,   // Maximum tokens to generate
    pub top_p: Option<f32>,        // Nucleus sampling
    pub stop: Option<Vec<String>>, // Stop sequences
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            max_tokens: None,
            top_p: None,
            stop: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Dense embedding vector
pub type Embedding = Vec<f32>;

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, PrompterError>;

    /// Embed a text for relevance scoring.
    ///
    /// Providers without an embedding endpoint keep the default, which reports
    /// [`PrompterError::EmbeddingsUnsupported`].
    async fn embed(&self, _text: &str) -> Result<Embedding, PrompterError> {
        Err(PrompterError::EmbeddingsUnsupported(
            self.provider_name().to_string(),
        ))
    }

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Submit a transcript under a system prompt and return the reply text.
///
/// The system prompt is sent as the leading system message; the reply content
/// is returned unmodified. Failures propagate as-is.
pub async fn send_request(
    client: &dyn ModelProviderClient,
    turns: &[ChatMessage],
    system_prompt: &str,
    options: CompletionOptions,
) -> Result<String, PrompterError> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(turns.iter().cloned());

    debug!(
        provider = client.provider_name(),
        model = client.model_name(),
        turns = turns.len(),
        system_prompt_len = system_prompt.len(),
        "Dispatching prompt"
    );

    let response = client.complete(messages, options).await?;
    debug!(
        model = %response.model,
        total_tokens = response.usage.total_tokens,
        "Received completion"
    );
    Ok(response.content)
}

// Helper function to map HTTP errors to PrompterError
pub(crate) fn map_http_error(error: reqwest::Error) -> PrompterError {
    if let Some(status) = error.status() {
        map_status_error(status.as_u16(), &error.to_string())
    } else if error.is_timeout() {
        PrompterError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        PrompterError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        PrompterError::ProviderError(format!("HTTP error: {}", error))
    }
}

pub(crate) fn map_status_error(status: u16, detail: &str) -> PrompterError {
    match status {
        401 | 403 => PrompterError::ProviderAuthFailed(format!("Authentication failed: {}", detail)),
        429 => PrompterError::ProviderRateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => PrompterError::ProviderModelNotFound(format!("Model not found: {}", detail)),
        _ => PrompterError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

/// Read an error body for a failed response, mapping the status code.
pub(crate) async fn error_from_response(response: reqwest::Response) -> PrompterError {
    let status = response.status().as_u16();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    map_status_error(status, &error_text)
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_provider_http_client() -> Result<Client, PrompterError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| PrompterError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Turns provider configuration into a client. Injected into the assembler so
/// tests can substitute doubles.
pub trait ProviderClientResolver: Send + Sync {
    fn create_provider_client(
        &self,
        provider: &ModelProvider,
    ) -> Result<Arc<dyn ModelProviderClient>, PrompterError>;
}

/// Factory for the HTTP provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Arc<dyn ModelProviderClient>, PrompterError> {
        match provider {
            ModelProvider::Gemini {
                model,
                api_key,
                base_url,
                embedding_model,
            } => Ok(Arc::new(GeminiClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
                embedding_model.clone(),
            )?)),
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
                embedding_model,
            } => Ok(Arc::new(OpenAIClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
                embedding_model.clone(),
            )?)),
        }
    }
}

impl ProviderClientResolver for ProviderFactory {
    fn create_provider_client(
        &self,
        provider: &ModelProvider,
    ) -> Result<Arc<dyn ModelProviderClient>, PrompterError> {
        Self::create_client(provider)
    }
}

// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    responses: Vec<String>,
    current: std::sync::Arc<std::sync::Mutex<usize>>,
    requests: std::sync::Arc<std::sync::Mutex<Vec<Vec<ChatMessage>>>>,
    embeddings: bool,
    provider_name: String,
    model_name: String,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(provider_name: String, model_name: String, responses: Vec<String>) -> Self {
        Self {
            responses,
            current: std::sync::Arc::new(std::sync::Mutex::new(0)),
            requests: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
            embeddings: false,
            provider_name,
            model_name,
        }
    }

    /// Enable a bag-of-letters embedding so relevance ranking can be exercised.
    pub fn with_embeddings(mut self) -> Self {
        self.embeddings = true;
        self
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for MockProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, PrompterError> {
        self.requests.lock().unwrap().push(messages);
        let mut idx = self.current.lock().unwrap();
        let response = if *idx < self.responses.len() {
            self.responses[*idx].clone()
        } else {
            "Mock response".to_string()
        };
        *idx += 1;

        Ok(CompletionResponse {
            content: response,
            model: self.model_name.clone(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn embed(&self, text: &str) -> Result<Embedding, PrompterError> {
        if !self.embeddings {
            return Err(PrompterError::EmbeddingsUnsupported(
                self.provider_name.clone(),
            ));
        }
        let mut vector = vec![0.0f32; 26];
        for c in text.to_ascii_lowercase().chars() {
            if c.is_ascii_lowercase() {
                vector[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        Ok(vector)
    }

    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
