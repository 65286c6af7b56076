//! Template resolution.
//!
//! Profile templates contain `$UPPER_SNAKE_CASE` placeholders. The resolver
//! fills them from a per-call context bundle:
//!
//! - Conversation, coding and memory templates use [`ConversationContext`].
//! - Goal-selection templates use [`GoalContext`].
//!
//! Tokens that are not recognised for the template's kind are left verbatim
//! and reported in [`ResolvedPrompt::unresolved`].

pub mod context;
pub mod placeholder;
pub mod resolver;
pub mod text;

pub use context::{ConversationContext, GoalContext, GoalType, HistoryEntry};
pub use placeholder::Placeholder;
pub use resolver::{PromptResolver, ResolvedPrompt};

use crate::error::PrompterError;
use std::fmt;
use std::str::FromStr;

/// The four templates a profile carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Conversing,
    Coding,
    SavingMemory,
    GoalSelect,
}

impl PromptKind {
    pub const ALL: [PromptKind; 4] = [
        PromptKind::Conversing,
        PromptKind::Coding,
        PromptKind::SavingMemory,
        PromptKind::GoalSelect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Conversing => "conversing",
            PromptKind::Coding => "coding",
            PromptKind::SavingMemory => "saving_memory",
            PromptKind::GoalSelect => "goal_select",
        }
    }

    /// Placeholders this kind's template may use, in evaluation order.
    pub fn placeholders(&self) -> &'static [Placeholder] {
        match self {
            PromptKind::GoalSelect => &placeholder::GOAL_ORDER,
            _ => &placeholder::CONVERSATION_ORDER,
        }
    }

    pub fn recognises(&self, token: &str) -> bool {
        self.placeholders().iter().any(|p| p.token() == token)
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptKind {
    type Err = PrompterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| PrompterError::ConfigError(format!("Unknown prompt kind: {}", s)))
    }
}

/// A template token and whether the template's kind recognises it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderUsage {
    pub token: String,
    pub recognised: bool,
}

/// Distinct tokens of `template`, checked against `kind`.
pub fn catalogue(kind: PromptKind, template: &str) -> Vec<PlaceholderUsage> {
    placeholder::tokens(template)
        .into_iter()
        .map(|token| PlaceholderUsage {
            token: token.to_string(),
            recognised: kind.recognises(token),
        })
        .collect()
}
