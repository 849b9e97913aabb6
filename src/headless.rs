//! Headless output: one-shot search and listing rendered for a pipe.
//!
//! The binary's `search` and `list` subcommands run one cycle through the
//! same pipeline the TUI uses and print the outcome either as grouped plain
//! text or as JSON.

use mes_core::records;
use mes_core::types::{ResourceKind, ResultSet};
use std::fmt::Write as _;

/// Output format of the `search` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Grouped plain text, one category heading per group. `typed` is the query
/// as the user wrote it; the set only keeps its folded form.
///
/// ```text
/// Ressources
///   ⚙ Équipements — Aller à /equipements  [/equipements]
/// ```
pub fn render_text(set: &ResultSet, typed: &str) -> String {
    if set.is_empty() {
        return format!("Aucun résultat pour «{}»\n", typed.trim());
    }
    let mut out = String::new();
    for group in &set.groups {
        let _ = writeln!(out, "{}", group.category);
        for result in &group.results {
            let _ = writeln!(
                out,
                "  {} {} — {}  [{}]",
                result.icon, result.display_name, result.description, result.navigation_path
            );
        }
    }
    let _ = writeln!(out, "{} résultat(s)", set.total_count());
    out
}

pub fn render_json(set: &ResultSet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(set)
}

pub fn render(set: &ResultSet, format: Format, typed: &str) -> serde_json::Result<String> {
    match format {
        Format::Text => Ok(render_text(set, typed)),
        Format::Json => render_json(set).map(|mut s| {
            s.push('\n');
            s
        }),
    }
}

/// Warning line for sources that failed during the cycle, if any.
pub fn failed_sources_notice(set: &ResultSet) -> Option<String> {
    if set.failed_sources.is_empty() {
        return None;
    }
    let kinds: Vec<String> = set.failed_sources.iter().map(|k| k.to_string()).collect();
    Some(format!("warning: sources unavailable: {}", kinds.join(", ")))
}

/// One line per record of a `list` call.
pub fn render_records(kind: ResourceKind, raw: Vec<serde_json::Value>) -> String {
    let projected = records::project(kind, raw);
    let mut out = String::new();
    for record in &projected {
        let _ = writeln!(out, "{} {} — {}", record.icon, record.display_name, record.description);
    }
    let _ = writeln!(out, "{} {}(s)", projected.len(), kind);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
