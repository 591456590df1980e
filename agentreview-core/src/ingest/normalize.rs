//! Log line decoding.
//!
//! Agent logs went through at least two schema revisions. Older lines put
//! `role`, `model`, `content` and `usage` on the envelope; newer lines nest
//! them under `message`. Each field is resolved with an explicit, ordered
//! fallback list and the first present value wins:
//!
//! | Field | Candidates (in order) |
//! |-------|-----------------------|
//! | timestamp | `timestamp`, `message.timestamp` |
//! | role | `message.role`, `role` |
//! | model | `message.model`, `model` |
//! | cost | `message.usage.cost(.total)`, `usage.cost(.total)`, `message.cost`, `cost` |
//! | content | `message.content`, `content` |
//! | stop reason | `message.stopReason`, `message.stop_reason`, `stopReason` |
//! | error | `message.errorMessage`, `errorMessage`, `message.error`, `error` |
//! | tool error | `message.isError`, `isError`, `details.isError`, raw-text fallback |
//!
//! Scalar fields of the wrong JSON type are treated as absent rather than
//! failing the whole line.

use crate::analytics::cost::resolve_cost;
use crate::format::parse_timestamp;
use crate::types::{EventType, Record, Role, ToolCall};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

/// Fallback tool-error detection on the serialized line, escaped or not.
static RAW_IS_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\\?"isError\\?"\s*:\s*true"#).expect("RAW_IS_ERROR: compile-time constant")
});

// ============================================
// Raw JSONL line types (serde deserialization)
// ============================================

/// Envelope of a single log line.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawLine {
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    record_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    timestamp: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    role: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    model: Option<String>,
    #[serde(deserialize_with = "lenient")]
    usage: Option<RawUsage>,
    cost: Option<Value>,
    content: Option<RawContent>,
    #[serde(deserialize_with = "lenient_string")]
    stop_reason: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    error_message: Option<String>,
    error: Option<Value>,
    #[serde(deserialize_with = "lenient_bool")]
    is_error: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    details: Option<RawDetails>,
    #[serde(deserialize_with = "lenient")]
    message: Option<RawMessage>,
}

/// Nested `message` object (newer schema).
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawMessage {
    #[serde(deserialize_with = "lenient_string")]
    timestamp: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    role: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    model: Option<String>,
    #[serde(deserialize_with = "lenient")]
    usage: Option<RawUsage>,
    cost: Option<Value>,
    content: Option<RawContent>,
    #[serde(deserialize_with = "lenient_string")]
    stop_reason: Option<String>,
    #[serde(rename = "stop_reason", deserialize_with = "lenient_string")]
    stop_reason_snake: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    error_message: Option<String>,
    error: Option<Value>,
    #[serde(deserialize_with = "lenient_bool")]
    is_error: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawUsage {
    cost: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawDetails {
    #[serde(deserialize_with = "lenient_bool")]
    is_error: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<Value>),
    Other(Value),
}

/// A content block, decoded one at a time so a single odd block cannot
/// discard the rest of the line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "toolCall")]
    ToolCall {
        #[serde(default)]
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    // Catch-all for unknown block types
    #[serde(other)]
    Unknown,
}

/// Nested objects of an unexpected shape are treated as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()))
}

/// A usable cost: finite, non-negative number.
fn cost_value(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v >= 0.0)
}

/// `usage.cost` is either a number or an object with `total`.
fn usage_cost(usage: &RawUsage) -> Option<f64> {
    match usage.cost.as_ref()? {
        Value::Object(map) => map.get("total").and_then(cost_value),
        other => cost_value(other),
    }
}

/// `error` is either a message string or an object carrying one.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Decode one log line into a [`Record`].
///
/// Returns `Err` only when the line is not a JSON object at all; callers count
/// those as malformed lines.
pub fn normalize_line(
    session_id: &str,
    source_path: &Path,
    line: &str,
) -> std::result::Result<Record, serde_json::Error> {
    let value: Value = serde_json::from_str(line)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("log line is not a JSON object"));
    }
    let raw: RawLine = serde_json::from_value(value)?;
    Ok(build_record(session_id, source_path, raw, line))
}

fn build_record(session_id: &str, source_path: &Path, raw: RawLine, line: &str) -> Record {
    let message = raw.message.unwrap_or_default();

    let timestamp = raw.timestamp.or(message.timestamp);
    let at = timestamp.as_deref().and_then(parse_timestamp);

    let role = message.role.or(raw.role).map(|r| Role::from_raw(&r));
    let model = message.model.or(raw.model);

    let declared_cost = message
        .usage
        .as_ref()
        .and_then(usage_cost)
        .or_else(|| raw.usage.as_ref().and_then(usage_cost))
        .or_else(|| message.cost.as_ref().and_then(cost_value))
        .or_else(|| raw.cost.as_ref().and_then(cost_value));

    let stop_reason = message
        .stop_reason
        .or(message.stop_reason_snake)
        .or(raw.stop_reason);

    let error_message = message
        .error_message
        .or(raw.error_message)
        .or_else(|| message.error.as_ref().and_then(error_text))
        .or_else(|| raw.error.as_ref().and_then(error_text));

    let (content, text, tool_calls) = decode_content(message.content.or(raw.content));

    let tool_error = message
        .is_error
        .or(raw.is_error)
        .or_else(|| raw.details.as_ref().and_then(|d| d.is_error))
        .unwrap_or_else(|| role == Some(Role::ToolResult) && RAW_IS_ERROR.is_match(line));

    let (cost_usd, cost_estimated) = resolve_cost(declared_cost, text.chars().count(), model.as_deref());

    Record {
        session_id: session_id.to_string(),
        source_path: source_path.to_path_buf(),
        event_type: EventType::from_raw(raw.record_type.as_deref()),
        timestamp,
        at,
        role,
        stop_reason,
        model,
        declared_cost,
        content,
        text,
        tool_calls,
        raw: line.to_string(),
        tool_error,
        error_message,
        cost_usd,
        cost_estimated,
    }
}

/// Split content into structured blocks, plain text and tool calls.
fn decode_content(content: Option<RawContent>) -> (Vec<Value>, String, Vec<ToolCall>) {
    let mut texts: Vec<String> = Vec::new();
    let mut tool_calls = Vec::new();

    let blocks = match content {
        None | Some(RawContent::Other(_)) => Vec::new(),
        Some(RawContent::Text(text)) => {
            let block = serde_json::json!({ "type": "text", "text": text });
            texts.push(text);
            vec![block]
        }
        Some(RawContent::Blocks(blocks)) => {
            for block in &blocks {
                match serde_json::from_value::<ContentBlock>(block.clone()) {
                    Ok(ContentBlock::Text { text }) => {
                        if !text.is_empty() {
                            texts.push(text);
                        }
                    }
                    Ok(ContentBlock::ToolCall { name, arguments })
                    | Ok(ContentBlock::ToolUse {
                        name,
                        input: arguments,
                    }) => {
                        if !name.trim().is_empty() {
                            tool_calls.push(ToolCall { name, arguments });
                        }
                    }
                    Ok(ContentBlock::Unknown) | Err(_) => {}
                }
            }
            blocks
        }
    };

    (blocks, texts.join("\n"), tool_calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(line: serde_json::Value) -> Record {
        normalize_line("sess", Path::new("/logs/sess.jsonl"), &line.to_string())
            .expect("line should decode")
    }

    #[test]
    fn new_format_line() {
        let record = decode(json!({
            "type": "message",
            "timestamp": "2026-02-14T10:00:00Z",
            "message": {
                "role": "assistant",
                "model": "anthropic/claude-sonnet-4-5",
                "stopReason": "toolUse",
                "usage": {"cost": {"total": 0.0123}},
                "content": [
                    {"type": "text", "text": "Reading the file"},
                    {"type": "toolCall", "id": "tc-1", "name": "read", "arguments": {"path": "src/a.ts"}},
                    {"type": "thinking", "thinking": "hmm"}
                ]
            }
        }));

        assert_eq!(record.session_id, "sess");
        assert_eq!(record.event_type, EventType::Message);
        assert_eq!(record.role, Some(Role::Assistant));
        assert_eq!(record.model.as_deref(), Some("anthropic/claude-sonnet-4-5"));
        assert_eq!(record.declared_cost, Some(0.0123));
        assert_eq!(record.cost_usd, 0.0123);
        assert!(!record.cost_estimated);
        assert_eq!(record.text, "Reading the file");
        assert_eq!(record.tool_calls.len(), 1);
        assert_eq!(record.tool_calls[0].name, "read");
        assert_eq!(record.content.len(), 3);
        assert_eq!(record.date(), Some("2026-02-14"));
        assert!(record.at.is_some());
    }

    #[test]
    fn old_format_line() {
        let record = decode(json!({
            "type": "message",
            "role": "user",
            "model": "claude-opus-4",
            "content": "please fix the login bug",
            "message": {"timestamp": "2026-02-10T08:00:00Z"}
        }));

        assert_eq!(record.role, Some(Role::User));
        assert_eq!(record.timestamp.as_deref(), Some("2026-02-10T08:00:00Z"));
        assert_eq!(record.model.as_deref(), Some("claude-opus-4"));
        assert_eq!(record.text, "please fix the login bug");
        assert!(record.cost_estimated);
        assert!(record.cost_usd > 0.0);
    }

    #[test]
    fn nested_fields_win_over_envelope() {
        let record = decode(json!({
            "role": "user",
            "model": "old-model",
            "usage": {"cost": 0.5},
            "message": {"role": "assistant", "model": "new-model", "usage": {"cost": {"total": 0.25}}}
        }));
        assert_eq!(record.role, Some(Role::Assistant));
        assert_eq!(record.model.as_deref(), Some("new-model"));
        assert_eq!(record.declared_cost, Some(0.25));
    }

    #[test]
    fn envelope_timestamp_wins() {
        let record = decode(json!({
            "timestamp": "2026-02-11T00:00:00Z",
            "message": {"timestamp": "2026-02-12T00:00:00Z", "role": "user"}
        }));
        assert_eq!(record.date(), Some("2026-02-11"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record = decode(json!({"type": "session", "id": "abc"}));
        assert_eq!(record.event_type, EventType::Session);
        assert!(record.role.is_none());
        assert!(record.timestamp.is_none());
        assert!(record.at.is_none());
        assert!(record.text.is_empty());
        assert!(record.tool_calls.is_empty());
        assert!(!record.has_error_signal());
    }

    #[test]
    fn wrong_scalar_types_are_ignored() {
        let record = decode(json!({
            "timestamp": 1700000000,
            "message": {"role": 7, "model": null, "content": [{"type": "text", "text": "hi"}]}
        }));
        assert!(record.timestamp.is_none());
        assert!(record.role.is_none());
        assert_eq!(record.text, "hi");
    }

    #[test]
    fn error_signals() {
        let stopped = decode(json!({"message": {"role": "assistant", "stopReason": "error"}}));
        assert!(stopped.is_error_event());

        let with_message = decode(json!({
            "message": {"role": "assistant", "errorMessage": "rate limited"}
        }));
        assert_eq!(with_message.error_message.as_deref(), Some("rate limited"));

        let object_error = decode(json!({"error": {"message": "boom"}}));
        assert_eq!(object_error.error_message.as_deref(), Some("boom"));

        let flagged = decode(json!({"message": {"role": "toolResult", "isError": true}}));
        assert!(flagged.tool_error);
        assert!(!flagged.is_error_event());
    }

    #[test]
    fn raw_is_error_fallback_only_for_tool_results() {
        let tool = decode(json!({
            "message": {"role": "toolResult", "content": [{"type": "text", "text": "{\"isError\":true}"}]}
        }));
        assert!(tool.tool_error);

        let assistant = decode(json!({
            "message": {"role": "assistant", "content": [{"type": "text", "text": "{\"isError\":true}"}]}
        }));
        assert!(!assistant.tool_error);
    }

    #[test]
    fn explicit_false_flag_beats_raw_text() {
        let record = decode(json!({
            "message": {"role": "toolResult", "isError": false, "content": "\"isError\": true"}
        }));
        assert!(!record.tool_error);
    }

    #[test]
    fn tool_use_blocks_are_tool_calls() {
        let record = decode(json!({
            "message": {"role": "assistant", "content": [
                {"type": "tool_use", "id": "x", "name": "Edit", "input": {"file_path": "src/lib.rs"}},
                {"type": "toolCall", "name": "", "arguments": {}}
            ]}
        }));
        assert_eq!(record.tool_calls.len(), 1);
        assert_eq!(record.tool_calls[0].name, "Edit");
        assert_eq!(record.tool_calls[0].arguments["file_path"], "src/lib.rs");
    }

    #[test]
    fn odd_nested_shapes_do_not_fail_the_line() {
        let record = decode(json!({
            "role": "user",
            "content": "hello",
            "details": "n/a",
            "usage": 12,
            "message": "not an object"
        }));
        assert_eq!(record.role, Some(Role::User));
        assert_eq!(record.text, "hello");
        assert!(record.declared_cost.is_none());
    }

    #[test]
    fn non_object_lines_are_rejected() {
        let path = Path::new("x.jsonl");
        assert!(normalize_line("s", path, "{ this is malformed json").is_err());
        assert!(normalize_line("s", path, "[1, 2, 3]").is_err());
        assert!(normalize_line("s", path, "\"text\"").is_err());
    }

    #[test]
    fn negative_declared_cost_falls_back_to_estimate() {
        let record = decode(json!({"message": {"role": "assistant", "cost": -1.0}}));
        assert!(record.declared_cost.is_none());
        assert!(record.cost_estimated);
    }
}
