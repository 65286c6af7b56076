//! Serializations of conversation state into prompt text.

use crate::prompt::context::HistoryEntry;
use crate::provider::{ChatMessage, MessageRole};

/// Render turns the way examples and summaries present them to the model.
pub fn stringify_turns(turns: &[ChatMessage]) -> String {
    let mut res = String::new();
    for turn in turns {
        match turn.role {
            MessageRole::Assistant => {
                res.push_str("\nYour output:\n");
                res.push_str(&turn.content);
            }
            MessageRole::System => {
                res.push_str("\nSystem output: ");
                res.push_str(&turn.content);
            }
            MessageRole::User => {
                res.push_str("\nUser input: ");
                res.push_str(&turn.content);
            }
        }
    }
    res.trim().to_string()
}

/// `source: content` per line, trimmed.
pub fn format_history(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| format!("{}: {}", entry.source, entry.content))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn join_buildings(buildings: &[String]) -> String {
    buildings.join(", ")
}
