//! Documentation providers consulted by the resolver.
//!
//! Command documentation and agent statistics come from the command layer;
//! skill documentation from the skill library. Both are opaque string
//! producers here.

use crate::error::{PrompterError, StorageError};
use async_trait::async_trait;
use std::path::Path;

/// Source of `$STATS` and `$COMMAND_DOCS`
#[async_trait]
pub trait CommandDocsProvider: Send + Sync {
    /// Current agent statistics. Depends on live agent state, so it is only
    /// gathered when a template asks for it.
    async fn stats(&self) -> Result<String, PrompterError>;

    /// Static documentation for the exposed commands.
    fn command_docs(&self) -> String;
}

/// Source of `$CODE_DOCS`
pub trait SkillDocsProvider: Send + Sync {
    fn skill_docs(&self) -> String;
}

/// Fixed-text documentation, used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDocs {
    pub stats: String,
    pub commands: String,
    pub skills: String,
}

impl StaticDocs {
    pub fn new(
        stats: impl Into<String>,
        commands: impl Into<String>,
        skills: impl Into<String>,
    ) -> Self {
        Self {
            stats: stats.into(),
            commands: commands.into(),
            skills: skills.into(),
        }
    }

    /// Load each text from an optional file; missing entries stay empty.
    pub fn from_files(
        stats: Option<&Path>,
        commands: Option<&Path>,
        skills: Option<&Path>,
    ) -> Result<Self, PrompterError> {
        Ok(Self {
            stats: read_optional(stats)?,
            commands: read_optional(commands)?,
            skills: read_optional(skills)?,
        })
    }
}

fn read_optional(path: Option<&Path>) -> Result<String, PrompterError> {
    match path {
        None => Ok(String::new()),
        Some(path) if !path.exists() => Err(StorageError::NotFound(path.to_path_buf()).into()),
        Some(path) => Ok(std::fs::read_to_string(path).map_err(StorageError::from)?),
    }
}

#[async_trait]
impl CommandDocsProvider for StaticDocs {
    async fn stats(&self) -> Result<String, PrompterError> {
        Ok(self.stats.clone())
    }

    fn command_docs(&self) -> String {
        self.commands.clone()
    }
}

impl SkillDocsProvider for StaticDocs {
    fn skill_docs(&self) -> String {
        self.skills.clone()
    }
}
