//! Prompter: profile-driven prompt assembly
//!
//! Loads an agent profile of prompt templates, fills the templates from
//! per-call context (agent name, documentation, few-shot examples, memory,
//! history) and dispatches the result to a Gemini or OpenAI-compatible
//! backend.

pub mod assembler;
pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod example_store;
pub mod logging;
pub mod profile;
pub mod prompt;
pub mod provider;
