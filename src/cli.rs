//! CLI domain: parse, route and presentation only.
//! Orchestration lives in the assembler; the route table just wires it up.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands, GoalArgs, GoalTypeArg};
pub use presentation::{format_inspect_table, format_resolved};
pub use route::RunContext;
