//! Layered configuration loading.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::PrompterConfig;
use crate::error::PrompterError;
use config::{Environment, File};
use std::path::{Path, PathBuf};

/// Environment prefix for overrides, e.g. `PROMPTER_BOTS_DIR` or
/// `PROMPTER_PROVIDERS__OPENAI__API_KEY`.
pub const ENV_PREFIX: &str = "PROMPTER";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence, lowest first: defaults, global file, `config/config.toml`,
    /// `config/{PROMPTER_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<PrompterConfig, PrompterError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder.add_source(environment()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load from one explicit file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<PrompterConfig, PrompterError> {
        if !path.exists() {
            return Err(PrompterError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
