//! Installed-skill usage.
//!
//! Skill names come from an external document; usage is inferred from tool
//! invocation names. A tool `T` counts as a use of skill `S` when, ignoring
//! case, `T == S`, `T` starts with `S` followed by a separator, or `S`
//! appears between two separators inside `T` (`mcp.git.commit` uses `git`).

use crate::analytics::heuristics::TOOL_NAME_SEPARATORS;
use crate::format::{ratio, round_pct};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Entries listed under `skills.top_used`.
const TOP_USED: usize = 4;

/// Does tool invocation `tool` belong to skill `skill`?
pub fn skill_matches(skill: &str, tool: &str) -> bool {
    let skill = skill.to_lowercase();
    let tool = tool.to_lowercase();
    if skill.is_empty() {
        return false;
    }
    if tool == skill {
        return true;
    }
    TOOL_NAME_SEPARATORS.iter().any(|sep| {
        tool.starts_with(&format!("{skill}{sep}"))
            || TOOL_NAME_SEPARATORS
                .iter()
                .any(|lead| tool.contains(&format!("{lead}{skill}{sep}")))
    })
}

// ============================================
// Installed skill list
// ============================================

/// Read installed skill names from a JSON or TOML document.
///
/// A missing or unreadable document yields an empty list with a warning;
/// skill data is optional input.
pub fn load_installed(path: &Path) -> Vec<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skills config unreadable, assuming no installed skills");
            return Vec::new();
        }
    };

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed: Result<Value, String> = if is_toml {
        toml::from_str::<Value>(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&text).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(doc) => installed_from_document(&doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skills config invalid, assuming no installed skills");
            Vec::new()
        }
    }
}

/// Extract skill names from a parsed document.
///
/// Accepted shapes, under a root `skills` key or at the root:
/// - a mapping keyed by skill name (`{"git": {...}}`), optionally nested
///   under `entries`
/// - a list of names or of objects carrying `name`, `id` or `skill`
pub fn installed_from_document(doc: &Value) -> Vec<String> {
    let section = doc.get("skills").unwrap_or(doc);
    let section = section.get("entries").unwrap_or(section);

    let names: Vec<String> = match section {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items.iter().filter_map(entry_name).collect(),
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty() && seen.insert(n.clone()))
        .collect()
}

fn entry_name(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ["name", "id", "skill"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

// ============================================
// Usage summary
// ============================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkillUsage {
    pub name: String,
    pub calls: usize,
    pub pct_of_total: f64,
}

/// The `skills` report section.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SkillsSummary {
    pub installed: usize,
    pub used: usize,
    pub top_used: Vec<SkillUsage>,
    pub unused: Vec<String>,
}

/// Match every tool invocation against the installed skills.
pub fn summarize<'a, I>(installed: &[String], tool_names: I) -> SkillsSummary
where
    I: IntoIterator<Item = &'a str>,
{
    let tool_names: Vec<&str> = tool_names.into_iter().collect();

    let calls: Vec<(String, usize)> = installed
        .iter()
        .map(|skill| {
            let n = tool_names
                .iter()
                .filter(|tool| skill_matches(skill, tool))
                .count();
            (skill.clone(), n)
        })
        .collect();

    let total: usize = calls.iter().map(|(_, n)| n).sum();

    let mut used: Vec<&(String, usize)> = calls.iter().filter(|(_, n)| *n > 0).collect();
    used.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    SkillsSummary {
        installed: installed.len(),
        used: used.len(),
        top_used: used
            .iter()
            .take(TOP_USED)
            .map(|(name, n)| SkillUsage {
                name: name.clone(),
                calls: *n,
                pct_of_total: round_pct(ratio(*n as f64, total as f64) * 100.0),
            })
            .collect(),
        unused: calls
            .iter()
            .filter(|(_, n)| *n == 0)
            .map(|(name, _)| name.clone())
            .collect(),
    }
}
