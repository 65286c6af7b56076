//! CLI route: run context and the single dispatch table.

use crate::assembler::PromptAssembler;
use crate::cli::parse::{Commands, GoalArgs, GoalTypeArg};
use crate::cli::presentation::{format_inspect_table, format_resolved};
use crate::config::{resolve_path, ConfigLoader, PrompterConfig};
use crate::docs::StaticDocs;
use crate::error::PrompterError;
use crate::profile::{Profile, ProfileStore};
use crate::prompt::{
    ConversationContext, GoalContext, GoalType, HistoryEntry, PromptKind, PromptResolver,
};
use crate::provider::{ChatMessage, ProviderFactory};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: workspace, loaded configuration and the
/// profile to operate on.
pub struct RunContext {
    workspace_root: PathBuf,
    config: PrompterConfig,
    profile_override: Option<PathBuf>,
}

impl RunContext {
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        profile_override: Option<PathBuf>,
    ) -> Result<Self, PrompterError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.ensure_valid()?;

        Ok(Self {
            workspace_root,
            config,
            profile_override,
        })
    }

    pub fn config(&self) -> &PrompterConfig {
        &self.config
    }

    fn profile_path(&self) -> Result<PathBuf, PrompterError> {
        self.profile_override
            .as_ref()
            .or(self.config.profile.as_ref())
            .map(|p| resolve_path(&self.workspace_root, p))
            .ok_or_else(|| {
                PrompterError::ConfigError(
                    "No profile configured (pass --profile or set `profile` in config)".to_string(),
                )
            })
    }

    fn load_profile(&self) -> Result<Profile, PrompterError> {
        Profile::load(&self.profile_path()?)
    }

    fn docs(&self) -> Result<Arc<StaticDocs>, PrompterError> {
        Ok(Arc::new(self.config.docs.load(&self.workspace_root)?))
    }

    fn build_assembler(&self) -> Result<PromptAssembler, PrompterError> {
        let profile = self.load_profile()?;
        let docs = self.docs()?;
        let store = ProfileStore::new(resolve_path(&self.workspace_root, &self.config.bots_dir));
        let assembler = PromptAssembler::from_profile(
            profile,
            &self.config.providers,
            &ProviderFactory,
            docs.clone(),
            docs,
            Some(&store),
        )?;
        Ok(assembler.with_select_num(self.config.examples.select_num))
    }

    /// Execute a command and return its printable output.
    pub async fn execute(&self, command: &Commands) -> Result<String, PrompterError> {
        match command {
            Commands::Inspect => {
                let profile = self.load_profile()?;
                Ok(format_inspect_table(&profile))
            }
            Commands::Render {
                kind,
                messages,
                memory,
                goal,
            } => {
                let kind: PromptKind = kind.parse()?;
                let profile = self.load_profile()?;
                let docs = self.docs()?;
                let resolver = PromptResolver::new(profile.name.clone(), docs.clone(), docs);
                let template = profile.template(kind);

                let resolved = match kind {
                    PromptKind::GoalSelect => {
                        let history = parse_history(&goal.history);
                        resolver.resolve_goal(template, &goal_context(goal, &history))
                    }
                    _ => {
                        let turns = parse_turns(messages);
                        let ctx = ConversationContext::new(&turns)
                            .with_memory(memory.as_deref())
                            .with_to_summarize(&turns);
                        resolver.resolve(template, &ctx).await?
                    }
                };
                Ok(format_resolved(&resolved))
            }
            Commands::Chat { messages, coding } => {
                let assembler = self.build_assembler()?;
                assembler.init_examples().await?;
                let turns = parse_turns(messages);
                info!(turns = turns.len(), coding = *coding, "Dispatching chat");
                if *coding {
                    assembler.prompt_coding(&turns).await
                } else {
                    assembler.prompt_convo(&turns).await
                }
            }
            Commands::Goal { goal } => {
                let assembler = self.build_assembler()?;
                let history = parse_history(&goal.history);
                assembler.prompt_goal(&goal_context(goal, &history)).await
            }
            Commands::Summarize { memory, turns } => {
                let assembler = self.build_assembler()?;
                let turns = parse_turns(turns);
                assembler.prompt_mem_saving(memory.as_deref(), &turns).await
            }
        }
    }
}

fn parse_turns(messages: &[String]) -> Vec<ChatMessage> {
    messages.iter().map(ChatMessage::user).collect()
}

/// `"source: content"` lines; a line without a colon is attributed to `user`.
fn parse_history(lines: &[String]) -> Vec<HistoryEntry> {
    lines
        .iter()
        .map(|line| match line.split_once(':') {
            Some((source, content)) => HistoryEntry::new(source.trim(), content.trim()),
            None => HistoryEntry::new("user", line.trim()),
        })
        .collect()
}

fn goal_context<'a>(args: &'a GoalArgs, history: &'a [HistoryEntry]) -> GoalContext<'a> {
    GoalContext {
        history,
        prev_goal: args.goal.as_deref(),
        prev_success: args.success,
        prev_goal_type: args.goal_type.map(|t| match t {
            GoalTypeArg::Item => GoalType::Item,
            GoalTypeArg::Building => GoalType::Building,
        }),
        buildings: &args.buildings,
    }
}
