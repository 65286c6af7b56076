//! Agent profile: templates, backend selector and example-set references.
//!
//! A profile is a JSON document loaded once per agent. Fields this crate does
//! not interpret are kept so the persisted copy carries everything the source
//! file had.

use crate::error::{PrompterError, StorageError};
use crate::example_store::Example;
use crate::prompt::PromptKind;
use crate::provider::ProviderType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the persisted profile copy inside `<bots_dir>/<name>/`.
pub const LAST_PROFILE_FILE: &str = "last_profile.json";

/// Where an example set comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExampleSetRef {
    /// Example conversations written directly in the profile
    Inline(Vec<Example>),
    /// JSON file holding a list of example conversations; relative paths
    /// resolve against the profile's directory
    Path(PathBuf),
}

impl Default for ExampleSetRef {
    fn default() -> Self {
        ExampleSetRef::Inline(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    /// Backend selector, e.g. `gpt-4o-mini` or `gemini-1.5-flash`
    pub model: String,

    /// Explicit backend kind (`gemini` or `openai`); inferred from `model`
    /// when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    pub conversing: String,
    pub coding: String,
    pub saving_memory: String,
    pub goal_select: String,

    #[serde(default)]
    pub conversation_examples: ExampleSetRef,
    #[serde(default)]
    pub coding_examples: ExampleSetRef,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl Profile {
    /// Load and validate a profile file.
    pub fn load(path: &Path) -> Result<Self, PrompterError> {
        if !path.exists() {
            return Err(StorageError::NotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path).map_err(StorageError::from)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let profile = Self::from_json(&content, base_dir)?;
        info!(profile = %profile.name, path = %path.display(), "Loaded profile");
        Ok(profile)
    }

    /// Parse a profile from JSON text. `base_dir` anchors relative
    /// example-set paths.
    pub fn from_json(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, PrompterError> {
        let mut profile: Profile = serde_json::from_str(content)
            .map_err(|e| PrompterError::InvalidProfile(format!("Failed to parse profile: {}", e)))?;
        profile.base_dir = base_dir.into();
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), PrompterError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name cannot be empty".to_string());
        } else if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            errors.push(format!("name '{}' is not a valid directory name", self.name));
        }
        if self.model.trim().is_empty() {
            errors.push("model cannot be empty".to_string());
        }
        for kind in PromptKind::ALL {
            if self.template(kind).trim().is_empty() {
                warn!(profile = %self.name, template = %kind, "Profile template is empty");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PrompterError::InvalidProfile(errors.join("; ")))
        }
    }

    pub fn template(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Conversing => &self.conversing,
            PromptKind::Coding => &self.coding,
            PromptKind::SavingMemory => &self.saving_memory,
            PromptKind::GoalSelect => &self.goal_select,
        }
    }

    /// Backend kind for this profile.
    ///
    /// An explicit `provider` wins; otherwise the kind is inferred from the
    /// model name. Neither matching is a fatal configuration error.
    pub fn backend_type(&self) -> Result<ProviderType, PrompterError> {
        match &self.provider {
            Some(provider) => provider.parse(),
            None => ProviderType::infer_from_model(&self.model),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Materialise an example set, reading it from disk when it is a path.
    pub fn resolve_examples(&self, set: &ExampleSetRef) -> Result<Vec<Example>, PrompterError> {
        match set {
            ExampleSetRef::Inline(examples) => Ok(examples.clone()),
            ExampleSetRef::Path(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.base_dir.join(path)
                };
                if !path.exists() {
                    return Err(StorageError::NotFound(path).into());
                }
                let content = std::fs::read_to_string(&path).map_err(StorageError::from)?;
                let examples: Vec<Example> = serde_json::from_str(&content)?;
                debug!(path = %path.display(), examples = examples.len(), "Read example set");
                Ok(examples)
            }
        }
    }
}

/// Directory tree holding per-agent state (`<root>/<name>/...`)
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name).join(LAST_PROFILE_FILE)
    }

    /// Write the profile as pretty JSON to `<root>/<name>/last_profile.json`.
    pub fn persist(&self, profile: &Profile) -> Result<PathBuf, PrompterError> {
        let path = self.path_for(&profile.name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(StorageError::from)?;
        }
        let content = serde_json::to_string_pretty(profile)?;
        std::fs::write(&path, content).map_err(StorageError::from)?;
        debug!(path = %path.display(), "Saved profile copy");
        Ok(path)
    }
}
