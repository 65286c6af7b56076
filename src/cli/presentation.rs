//! CLI presentation: text formatting for command results.

use crate::profile::Profile;
use crate::prompt::{catalogue, PromptKind, ResolvedPrompt};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

/// Table of every template kind with its placeholders.
pub fn format_inspect_table(profile: &Profile) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Template", "Placeholder", "Recognised"]);

    for kind in PromptKind::ALL {
        let usage = catalogue(kind, profile.template(kind));
        if usage.is_empty() {
            table.add_row(vec![kind.as_str(), "-", "-"]);
            continue;
        }
        for entry in usage {
            let recognised = if entry.recognised { "yes" } else { "no" };
            table.add_row(vec![kind.as_str(), entry.token.as_str(), recognised]);
        }
    }

    format!("Profile: {} ({})\n{}", profile.name, profile.model, table)
}

/// Resolved text followed by any unresolved placeholders.
pub fn format_resolved(resolved: &ResolvedPrompt) -> String {
    if resolved.unresolved.is_empty() {
        resolved.text.clone()
    } else {
        format!(
            "{}\n\nUnresolved placeholders: {}",
            resolved.text,
            resolved.unresolved.join(", ")
        )
    }
}
