//! CLI parse: clap types for prompter. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Prompter CLI - profile-driven prompt assembly
#[derive(Parser)]
#[command(name = "prompter")]
#[command(about = "Resolve agent prompt templates and dispatch them to a model backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Profile JSON file (overrides the configured profile)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List each template's placeholders and whether they are recognised
    Inspect,
    /// Resolve one template offline, without a backend or example sets
    Render {
        /// Template kind: conversing, coding, saving_memory, goal_select
        kind: String,
        /// Conversation message ("speaker: text"); repeatable
        #[arg(long = "message")]
        messages: Vec<String>,
        /// Prior memory
        #[arg(long)]
        memory: Option<String>,
        #[command(flatten)]
        goal: GoalArgs,
    },
    /// Send a conversation through the full pipeline and print the reply
    Chat {
        /// Conversation message ("speaker: text"); repeatable
        #[arg(long = "message", required = true)]
        messages: Vec<String>,
        /// Use the coding template and example set
        #[arg(long)]
        coding: bool,
    },
    /// Ask the model for the next goal
    Goal {
        #[command(flatten)]
        goal: GoalArgs,
    },
    /// Consolidate memory with a batch of turns
    Summarize {
        /// Prior memory
        #[arg(long)]
        memory: Option<String>,
        /// Turn to summarise ("speaker: text"); repeatable
        #[arg(long = "turn")]
        turns: Vec<String>,
    },
}

/// Inputs for goal-selection templates
#[derive(clap::Args, Debug, Default)]
pub struct GoalArgs {
    /// Previous goal
    #[arg(long)]
    pub goal: Option<String>,
    /// Whether the previous goal succeeded
    #[arg(long)]
    pub success: Option<bool>,
    /// What the previous goal was about
    #[arg(long, value_enum)]
    pub goal_type: Option<GoalTypeArg>,
    /// Building name; repeatable
    #[arg(long = "building")]
    pub buildings: Vec<String>,
    /// History line ("source: content"); repeatable
    #[arg(long = "history")]
    pub history: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalTypeArg {
    Item,
    Building,
}
