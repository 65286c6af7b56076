//! Per-call context bundles supplying placeholder values.

use crate::example_store::ExampleStore;
use crate::provider::ChatMessage;
use serde::{Deserialize, Serialize};

/// Speaker-attributed line of flat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub source: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// What the previous goal was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Obtaining an item
    Item,
    /// Building a structure
    Building,
}

impl GoalType {
    /// Map the legacy `prev_was_item` flag.
    pub fn from_was_item(was_item: bool) -> Self {
        if was_item {
            GoalType::Item
        } else {
            GoalType::Building
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            GoalType::Item => "obtaining a",
            GoalType::Building => "building a",
        }
    }
}

/// Values for the conversation, coding and memory templates
#[derive(Clone, Copy, Default)]
pub struct ConversationContext<'a> {
    pub messages: &'a [ChatMessage],
    pub examples: Option<&'a ExampleStore>,
    pub memory: Option<&'a str>,
    pub to_summarize: &'a [ChatMessage],
}

impl<'a> ConversationContext<'a> {
    pub fn new(messages: &'a [ChatMessage]) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_examples(mut self, examples: &'a ExampleStore) -> Self {
        self.examples = Some(examples);
        self
    }

    pub fn with_memory(mut self, memory: Option<&'a str>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_to_summarize(mut self, turns: &'a [ChatMessage]) -> Self {
        self.to_summarize = turns;
        self
    }
}

/// Values for the goal-selection template.
///
/// `prev_goal_type` and `prev_success` are tri-state: `None` means there was no
/// previous goal, which is not the same as a failed or building goal.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalContext<'a> {
    pub history: &'a [HistoryEntry],
    pub prev_goal: Option<&'a str>,
    pub prev_success: Option<bool>,
    pub prev_goal_type: Option<GoalType>,
    pub buildings: &'a [String],
}
