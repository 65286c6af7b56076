//! Error types for the prompt assembly layer.

use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors (profile files, example files, persisted copies)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by profile loading, prompt resolution and model dispatch
#[derive(Debug, Error)]
pub enum PrompterError {
    #[error("Unknown model {0}")]
    UnknownModel(String),

    #[error("Unknown provider type: {0} (expected 'gemini' or 'openai')")]
    UnknownProviderType(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Example set '{0}' used before it finished loading")]
    ExamplesNotLoaded(String),

    #[error("Example set '{0}' is already loading")]
    ExamplesLoading(String),

    #[error("Docs provider failed: {0}")]
    DocsFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Embeddings not supported by provider: {0}")]
    EmbeddingsUnsupported(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for PrompterError {
    fn from(err: config::ConfigError) -> Self {
        PrompterError::ConfigError(err.to_string())
    }
}

impl PrompterError {
    /// True for errors raised because configuration can never work as given.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            PrompterError::UnknownModel(_)
                | PrompterError::UnknownProviderType(_)
                | PrompterError::InvalidProfile(_)
                | PrompterError::ConfigError(_)
        )
    }
}
