//! Placeholder resolution.
//!
//! Resolution lexes the template once, computes a value for each recognised
//! token that actually occurs (in the documented order), and stitches the
//! result together in a single pass. Substituted values are never re-scanned.

use crate::docs::{CommandDocsProvider, SkillDocsProvider};
use crate::error::PrompterError;
use crate::prompt::context::{ConversationContext, GoalContext};
use crate::prompt::placeholder::{self, Placeholder, Segment, CONVERSATION_ORDER, GOAL_ORDER};
use crate::prompt::text::{format_history, join_buildings, stringify_turns};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A fully substituted template and the tokens that were left verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub text: String,
    pub unresolved: Vec<String>,
}

impl ResolvedPrompt {
    pub fn into_text(self) -> String {
        self.text
    }
}

pub struct PromptResolver {
    agent_name: String,
    commands: Arc<dyn CommandDocsProvider>,
    skills: Arc<dyn SkillDocsProvider>,
}

impl PromptResolver {
    pub fn new(
        agent_name: impl Into<String>,
        commands: Arc<dyn CommandDocsProvider>,
        skills: Arc<dyn SkillDocsProvider>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            commands,
            skills,
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Resolve a conversation, coding or memory template.
    ///
    /// Fails only when a value source fails: the stats provider, or an
    /// example store that has not finished loading.
    pub async fn resolve(
        &self,
        template: &str,
        ctx: &ConversationContext<'_>,
    ) -> Result<ResolvedPrompt, PrompterError> {
        let present = placeholder::tokens(template);
        let mut values = HashMap::new();

        for p in CONVERSATION_ORDER {
            if !present.contains(&p.token()) {
                continue;
            }
            let value = match p {
                Placeholder::Name => Some(self.agent_name.clone()),
                Placeholder::Stats => Some(self.commands.stats().await?),
                Placeholder::CommandDocs => Some(self.commands.command_docs()),
                Placeholder::CodeDocs => Some(self.skills.skill_docs()),
                Placeholder::Examples => match ctx.examples {
                    Some(store) => Some(store.create_example_message(ctx.messages).await?),
                    None => None,
                },
                Placeholder::Memory => Some(
                    ctx.memory
                        .filter(|m| !m.is_empty())
                        .unwrap_or("None.")
                        .to_string(),
                ),
                Placeholder::ToSummarize => Some(stringify_turns(ctx.to_summarize)),
                _ => None,
            };
            if let Some(value) = value {
                values.insert(p, value);
            }
        }

        Ok(substitute(template, &values))
    }

    /// Resolve a goal-selection template. Every goal value is local, so this
    /// cannot fail.
    pub fn resolve_goal(&self, template: &str, ctx: &GoalContext<'_>) -> ResolvedPrompt {
        let present = placeholder::tokens(template);
        let mut values = HashMap::new();

        for p in GOAL_ORDER {
            if !present.contains(&p.token()) {
                continue;
            }
            let value = match p {
                Placeholder::Name => Some(self.agent_name.clone()),
                Placeholder::GoalType => ctx.prev_goal_type.map(|t| t.phrase().to_string()),
                Placeholder::Goal => Some(
                    ctx.prev_goal
                        .filter(|g| !g.is_empty())
                        .unwrap_or("NONE")
                        .to_string(),
                ),
                Placeholder::Success => Some(
                    if ctx.prev_success.unwrap_or(false) {
                        "have"
                    } else {
                        "have not"
                    }
                    .to_string(),
                ),
                Placeholder::Buildings => Some(join_buildings(ctx.buildings)),
                Placeholder::History => Some(format_history(ctx.history)),
                _ => None,
            };
            if let Some(value) = value {
                values.insert(p, value);
            }
        }

        substitute(template, &values)
    }
}

fn substitute(template: &str, values: &HashMap<Placeholder, String>) -> ResolvedPrompt {
    let mut text = String::with_capacity(template.len());
    let mut unresolved: Vec<String> = Vec::new();

    for segment in placeholder::lex(template) {
        match segment {
            Segment::Text(s) => text.push_str(s),
            Segment::Token(token) => {
                match Placeholder::from_token(token).and_then(|p| values.get(&p)) {
                    Some(value) => text.push_str(value),
                    None => {
                        text.push_str(token);
                        if !unresolved.iter().any(|u| u == token) {
                            unresolved.push(token.to_string());
                        }
                    }
                }
            }
        }
    }

    for token in &unresolved {
        warn!(placeholder = %token, "Unresolved prompt placeholder");
    }

    ResolvedPrompt { text, unresolved }
}
