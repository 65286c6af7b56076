//! Shared test utilities for integration tests
//!
//! Backend and resolver doubles plus profile fixtures, so the pipeline can be
//! exercised end to end without network access.

use async_trait::async_trait;
use parking_lot::Mutex;
use prompter::config::ProvidersConfig;
use prompter::error::PrompterError;
use prompter::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, Embedding, ModelProvider,
    ModelProviderClient, ProviderClientResolver, ProviderConfig, TokenUsage,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Backend double: replies from a script and records every request.
pub struct ScriptedBackend {
    model: String,
    replies: Mutex<VecDeque<Result<String, PrompterError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    embeddings: bool,
    embed_calls: Mutex<usize>,
}

impl ScriptedBackend {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            embeddings: false,
            embed_calls: Mutex::new(0),
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: PrompterError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    /// Word-hash embeddings, enough to rank examples deterministically.
    pub fn with_embeddings(mut self) -> Self {
        self.embeddings = true;
        self
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock()
    }
}

#[async_trait]
impl ModelProviderClient for ScriptedBackend {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, PrompterError> {
        self.requests.lock().push(messages);
        let content = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("scripted reply".to_string()))?;
        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn embed(&self, text: &str) -> Result<Embedding, PrompterError> {
        if !self.embeddings {
            return Err(PrompterError::EmbeddingsUnsupported("scripted".to_string()));
        }
        *self.embed_calls.lock() += 1;
        let mut vector = vec![0.0f32; 64];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % vector.len();
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Resolver double: hands out one backend and records what it was asked for.
pub struct RecordingResolver {
    backend: Arc<ScriptedBackend>,
    requested: Mutex<Vec<ModelProvider>>,
}

impl RecordingResolver {
    pub fn new(backend: Arc<ScriptedBackend>) -> Self {
        Self {
            backend,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<ModelProvider> {
        self.requested.lock().clone()
    }
}

impl ProviderClientResolver for RecordingResolver {
    fn create_provider_client(
        &self,
        provider: &ModelProvider,
    ) -> Result<Arc<dyn ModelProviderClient>, PrompterError> {
        self.requested.lock().push(provider.clone());
        Ok(self.backend.clone())
    }
}

/// Provider settings with explicit keys so no environment lookup happens.
pub fn keyed_providers() -> ProvidersConfig {
    let keyed = |key: &str| ProviderConfig {
        api_key: Some(key.to_string()),
        ..Default::default()
    };
    ProvidersConfig {
        gemini: keyed("gemini-test-key"),
        openai: keyed("openai-test-key"),
    }
}

/// Profile used across the integration suite; `model` is the backend selector.
pub fn profile_json(model: &str) -> String {
    format!(
        r#"{{
    "name": "andy",
    "model": "{model}",
    "conversing": "You are $NAME, a Minecraft bot.\n$STATS\n$COMMAND_DOCS\n$EXAMPLES\nConversation begin:",
    "coding": "You are $NAME writing code.\n$CODE_DOCS\n$EXAMPLES",
    "saving_memory": "You are $NAME. Old memory: $MEMORY\nSummarize:\n$TO_SUMMARIZE",
    "goal_select": "You are $NAME. Last goal: $GOAL_TYPE $GOAL, you $SUCCESS succeeded. Built: $BUILDINGS\n$HISTORY",
    "conversation_examples": "examples/conversation.json",
    "coding_examples": [
        [
            {{"role": "user", "content": "greg: collect 10 wood"}},
            {{"role": "assistant", "content": "```await skills.collectBlock(bot, 'oak_log', 10);```"}}
        ]
    ]
}}"#
    )
}

const CONVERSATION_EXAMPLES: &str = r#"[
    [
        {"role": "user", "content": "miner_32: hey! what are you up to?"},
        {"role": "assistant", "content": "Nothing much miner_32, what do you need?"}
    ],
    [
        {"role": "user", "content": "grombo_Xx: come here"},
        {"role": "assistant", "content": "On my way! !goToPlayer('grombo_Xx')"}
    ],
    [
        {"role": "user", "content": "zZZn98: kill that zombie"},
        {"role": "assistant", "content": "Okay! !attack('zombie')"}
    ]
]"#;

/// Write the profile and its example file under `dir`; returns the profile path.
pub fn write_profile(dir: &Path, model: &str) -> PathBuf {
    std::fs::create_dir_all(dir.join("examples")).unwrap();
    std::fs::write(dir.join("examples").join("conversation.json"), CONVERSATION_EXAMPLES).unwrap();
    let path = dir.join("andy.json");
    std::fs::write(&path, profile_json(model)).unwrap();
    path
}
