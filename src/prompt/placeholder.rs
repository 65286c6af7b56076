//! Placeholder catalogue and template lexing.
//!
//! A placeholder token is `$` followed by the longest run of `A-Z` and `_`.
//! Lexing on whole tokens is what keeps `$GOAL` from matching the front of
//! `$GOAL_TYPE`. The same rule applies to every name: `$NAMES` is one unknown
//! token, and `$NAME_bot` lexes as the unknown `$NAME_` followed by `bot`.
//! Neither substitutes `$NAME`; templates separate a placeholder from trailing
//! capitals or underscores with other text.

use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[A-Z_]+").expect("Invalid placeholder regex"));

/// Every placeholder the resolver knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Name,
    Stats,
    CommandDocs,
    CodeDocs,
    Examples,
    Memory,
    ToSummarize,
    GoalType,
    Goal,
    Success,
    Buildings,
    History,
}

/// Evaluation order for conversation, coding and memory templates.
pub const CONVERSATION_ORDER: [Placeholder; 7] = [
    Placeholder::Name,
    Placeholder::Stats,
    Placeholder::CommandDocs,
    Placeholder::CodeDocs,
    Placeholder::Examples,
    Placeholder::Memory,
    Placeholder::ToSummarize,
];

/// Evaluation order for goal-selection templates.
pub const GOAL_ORDER: [Placeholder; 6] = [
    Placeholder::Name,
    Placeholder::GoalType,
    Placeholder::Goal,
    Placeholder::Success,
    Placeholder::Buildings,
    Placeholder::History,
];

impl Placeholder {
    pub const fn token(&self) -> &'static str {
        match self {
            Placeholder::Name => "$NAME",
            Placeholder::Stats => "$STATS",
            Placeholder::CommandDocs => "$COMMAND_DOCS",
            Placeholder::CodeDocs => "$CODE_DOCS",
            Placeholder::Examples => "$EXAMPLES",
            Placeholder::Memory => "$MEMORY",
            Placeholder::ToSummarize => "$TO_SUMMARIZE",
            Placeholder::GoalType => "$GOAL_TYPE",
            Placeholder::Goal => "$GOAL",
            Placeholder::Success => "$SUCCESS",
            Placeholder::Buildings => "$BUILDINGS",
            Placeholder::History => "$HISTORY",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        CONVERSATION_ORDER
            .iter()
            .chain(GOAL_ORDER.iter())
            .copied()
            .find(|p| p.token() == token)
    }
}

/// A piece of a lexed template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    Text(&'t str),
    Token(&'t str),
}

/// Split a template into literal text and placeholder tokens.
pub fn lex(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in PLACEHOLDER_REGEX.find_iter(template) {
        if m.start() > last {
            segments.push(Segment::Text(&template[last..m.start()]));
        }
        segments.push(Segment::Token(m.as_str()));
        last = m.end();
    }
    if last < template.len() {
        segments.push(Segment::Text(&template[last..]));
    }
    segments
}

/// Distinct tokens in first-seen order.
pub fn tokens(template: &str) -> Vec<&str> {
    let mut seen = Vec::new();
    for m in PLACEHOLDER_REGEX.find_iter(template) {
        if !seen.contains(&m.as_str()) {
            seen.push(m.as_str());
        }
    }
    seen
}
