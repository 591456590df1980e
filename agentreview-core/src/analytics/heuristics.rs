//! Text and tool-name heuristics.
//!
//! Every classification that depends on wording or naming conventions lives
//! here as a standalone predicate, so the word lists can grow without touching
//! the aggregation code.

use regex::Regex;
use std::sync::LazyLock;

/// Tool names (base segment) that modify files.
static WRITE_TOOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(write|write_file|edit|edit_file|multi_?edit|apply_?patch|patch|str_replace(_editor|_based_edit_tool)?|create_file|notebook_?edit)$",
    )
    .expect("WRITE_TOOL: compile-time constant")
});

/// Tool names (base segment) that only read files.
static READ_TOOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(read|read_file|view|cat|open_file)$")
        .expect("READ_TOOL: compile-time constant")
});

/// Path-shaped tokens: something with a slash, a dotfile, a bare file name
/// with a known extension, or a well-known extensionless build file.
static PATH_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:~|\.{1,2})?/)?(?:[\w.@-]+/)+[\w.@-]*$|^\.[A-Za-z_][\w.-]*$|^[\w@-][\w.@-]*\.(?i:rs|toml|lock|json|jsonl|ya?ml|md|txt|rst|py|ts|tsx|js|jsx|mjs|cjs|go|mod|sum|rb|java|kt|swift|c|h|cc|cpp|hpp|cs|php|sh|bash|zsh|sql|html|css|scss|ini|cfg|conf|env|xml|csv|log|ipynb|vue|svelte|proto|gradle|tf)$|^(?i:dockerfile|containerfile|makefile|gemfile|procfile|justfile|rakefile)(?:\.[\w-]+)?$",
    )
    .expect("PATH_LIKE: compile-time constant")
});

/// Files whose modification deserves a human look.
static SENSITIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|/)(?:package\.json|package-lock\.json|pnpm-lock\.yaml|yarn\.lock|cargo\.toml|cargo\.lock|pyproject\.toml|requirements[\w.-]*\.txt|go\.mod|go\.sum|gemfile(?:\.lock)?)$|(?:^|/)\.env(?:$|[./])|dockerfile|docker-compose|(?:^|/)compose\.ya?ml$|config|(?:^|/)src(?:/|$)",
    )
    .expect("SENSITIVE_PATH: compile-time constant")
});

static REVERT_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(revert(ed|ing|s)?|roll(ed|ing)?[ -]?back|rollback|undo(ne|ing)?|undid)\b")
        .expect("REVERT_WORDING: compile-time constant")
});

static CONTEXT_OVERFLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)context[ _-]?(length|window)[^\n]{0,40}(exceed|overflow)|maximum context length|prompt is too long|context[ _-]overflow|input is too long for requested model",
    )
    .expect("CONTEXT_OVERFLOW: compile-time constant")
});

static COMPACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bauto-?compact|\bcompact(ed|ing|ion)\b|conversation (was )?summari[sz]ed")
        .expect("COMPACTION: compile-time constant")
});

/// Separators used by namespaced tool names (`git.commit`, `mcp/fs`, `gh:pr`).
pub const TOOL_NAME_SEPARATORS: [char; 3] = ['.', '/', ':'];

/// Last segment of a namespaced tool name.
pub fn tool_base_name(name: &str) -> &str {
    name.rsplit(TOOL_NAME_SEPARATORS).next().unwrap_or(name)
}

/// Tool modifies files (write, edit, patch style).
pub fn is_write_tool(name: &str) -> bool {
    WRITE_TOOL.is_match(tool_base_name(name))
}

/// Tool reads files.
pub fn is_read_tool(name: &str) -> bool {
    READ_TOOL.is_match(tool_base_name(name))
}

/// Token looks like a filesystem path.
pub fn is_path_like(token: &str) -> bool {
    !token.contains("://") && token.len() > 1 && PATH_LIKE.is_match(token)
}

/// Path matches a manifest, env, container, config or source-dir pattern.
pub fn is_sensitive_path(path: &str) -> bool {
    SENSITIVE_PATH.is_match(path)
}

/// Text talks about reverting, rolling back or undoing.
pub fn mentions_revert(text: &str) -> bool {
    REVERT_WORDING.is_match(text)
}

/// Text reports a context window overflow.
pub fn mentions_context_overflow(text: &str) -> bool {
    CONTEXT_OVERFLOW.is_match(text)
}

/// Text reports a context compaction.
pub fn mentions_compaction(text: &str) -> bool {
    COMPACTION.is_match(text)
}

/// Collect path-shaped strings anywhere inside tool-call arguments.
///
/// Strings are split on whitespace so shell commands contribute their file
/// arguments. Order is first-seen; duplicates are kept for the caller to fold.
pub fn extract_paths(arguments: &serde_json::Value, out: &mut Vec<String>) {
    match arguments {
        serde_json::Value::String(s) => {
            for token in s.split_whitespace() {
                let token = token.trim_matches(|c: char| {
                    matches!(c, '"' | '\'' | '`' | ',' | ';' | '(' | ')' | '[' | ']' | '<' | '>')
                });
                if is_path_like(token) {
                    out.push(token.to_string());
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                extract_paths(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for value in map.values() {
                extract_paths(value, out);
            }
        }
        _ => {}
    }
}
