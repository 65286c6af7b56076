//! Configuration System
//!
//! Layered runtime configuration: where the profile lives, where per-agent
//! state is written, how each backend kind is reached, where documentation
//! text comes from, and logging. Every field has a default, so an empty
//! configuration is valid.

use crate::docs::StaticDocs;
use crate::error::PrompterError;
use crate::example_store::DEFAULT_SELECT_NUM;
use crate::logging::LoggingConfig;
use crate::provider::{ProviderConfig, ProviderType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrompterConfig {
    /// Profile JSON file
    #[serde(default)]
    pub profile: Option<PathBuf>,

    /// Per-agent state directory (profile copies land in `<bots_dir>/<name>/`)
    #[serde(default = "default_bots_dir")]
    pub bots_dir: PathBuf,

    /// Settings per backend kind
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Documentation text files
    #[serde(default)]
    pub docs: DocsConfig,

    #[serde(default)]
    pub examples: ExamplesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_bots_dir() -> PathBuf {
    PathBuf::from("./bots")
}

impl Default for PrompterConfig {
    fn default() -> Self {
        Self {
            profile: None,
            bots_dir: default_bots_dir(),
            providers: ProvidersConfig::default(),
            docs: DocsConfig::default(),
            examples: ExamplesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// One settings block per closed backend kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
}

impl ProvidersConfig {
    pub fn for_type(&self, provider_type: ProviderType) -> &ProviderConfig {
        match provider_type {
            ProviderType::Gemini => &self.gemini,
            ProviderType::OpenAI => &self.openai,
        }
    }
}

/// Files holding `$COMMAND_DOCS`, `$CODE_DOCS` and `$STATS` text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsConfig {
    #[serde(default)]
    pub commands: Option<PathBuf>,
    #[serde(default)]
    pub skills: Option<PathBuf>,
    #[serde(default)]
    pub stats: Option<PathBuf>,
}

impl DocsConfig {
    /// Read the configured files; relative paths resolve against `root`.
    pub fn load(&self, root: &Path) -> Result<StaticDocs, PrompterError> {
        let resolve = |p: &Option<PathBuf>| p.as_ref().map(|p| resolve_path(root, p));
        let stats = resolve(&self.stats);
        let commands = resolve(&self.commands);
        let skills = resolve(&self.skills);
        StaticDocs::from_files(stats.as_deref(), commands.as_deref(), skills.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesConfig {
    /// Examples placed in each conversation or coding prompt
    #[serde(default = "default_select_num")]
    pub select_num: usize,
}

fn default_select_num() -> usize {
    DEFAULT_SELECT_NUM
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            select_num: default_select_num(),
        }
    }
}

/// `path` unchanged when absolute, otherwise joined onto `root`.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Provider(String, String),
    Examples(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Examples(msg) => write!(f, "Examples: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PrompterConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for provider_type in [ProviderType::Gemini, ProviderType::OpenAI] {
            if let Err(e) = self.providers.for_type(provider_type).validate() {
                errors.push(ValidationError::Provider(provider_type.to_string(), e));
            }
        }

        if self.examples.select_num == 0 {
            errors.push(ValidationError::Examples(
                "select_num must be at least 1".to_string(),
            ));
        }

        if !["text", "json"].contains(&self.logging.format.as_str()) {
            errors.push(ValidationError::Logging(format!(
                "Invalid format '{}'",
                self.logging.format
            )));
        }
        if !["stdout", "stderr", "file"].contains(&self.logging.output.as_str()) {
            errors.push(ValidationError::Logging(format!(
                "Invalid output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into a single error.
    pub fn ensure_valid(&self) -> Result<(), PrompterError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PrompterError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })
    }
}
