//! Gemini `generateContent` / `embedContent` client.
//!
//! Gemini takes the system prompt out of band (`systemInstruction`) and calls
//! the assistant role `model`, so messages are split and renamed here.

use super::{
    build_provider_http_client, error_from_response, map_http_error, ChatMessage,
    CompletionOptions, CompletionResponse, Embedding, MessageRole, ModelProviderClient,
    TokenUsage,
};
use crate::error::PrompterError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const EMPTY_TURN_TEXT: &str = "Continue.";

#[derive(Serialize, Deserialize, Clone)]
struct Part {
    text: String,
}

#[derive(Serialize, Deserialize, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

fn text_content(role: Option<&str>, text: String) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part { text }],
    }
}

/// Split system messages into `systemInstruction`; the rest become contents.
fn build_request(messages: Vec<ChatMessage>, options: CompletionOptions) -> GenerateContentRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for msg in messages {
        match msg.role {
            MessageRole::System => system_parts.push(msg.content),
            MessageRole::User => contents.push(text_content(Some("user"), msg.content)),
            MessageRole::Assistant => contents.push(text_content(Some("model"), msg.content)),
        }
    }

    let system_text = system_parts.join("\n\n");

    // Gemini needs at least one content with non-empty text; a bare system
    // prompt becomes the user turn.
    let system_instruction = if contents.is_empty() {
        let text = if system_text.is_empty() {
            EMPTY_TURN_TEXT.to_string()
        } else {
            system_text
        };
        contents.push(text_content(Some("user"), text));
        None
    } else if system_text.is_empty() {
        None
    } else {
        Some(text_content(None, system_text))
    };

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
            top_p: options.top_p,
            stop_sequences: options.stop,
        },
    }
}

/// Gemini provider client
pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        embedding_model: Option<String>,
    ) -> Result<Self, PrompterError> {
        let client = build_provider_http_client()?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            embedding_model: embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl ModelProviderClient for GeminiClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, PrompterError> {
        let request = build_request(messages, options);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let generated: GenerateContentResponse = response.json().await.map_err(|e| {
            PrompterError::ProviderError(format!("Failed to parse response: {}", e))
        })?;

        let candidate = generated
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| PrompterError::ProviderError("No candidates in response".to_string()))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = generated
            .usage_metadata
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            });

        Ok(CompletionResponse {
            content,
            model: generated.model_version.unwrap_or_else(|| self.model.clone()),
            usage,
            finish_reason: candidate.finish_reason,
        })
    }

    async fn embed(&self, text: &str) -> Result<Embedding, PrompterError> {
        let url = format!(
            "{}/models/{}:embedContent",
            self.base_url, self.embedding_model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&EmbedContentRequest {
                content: text_content(None, text.to_string()),
            })
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: EmbedContentResponse = response.json().await.map_err(|e| {
            PrompterError::ProviderError(format!("Failed to parse embedding response: {}", e))
        })?;
        Ok(parsed.embedding.values)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
