//! Core domain types for agentreview
//!
//! These types represent the canonical data model that every analysis stage
//! consumes. Raw log lines are decoded once into [`Record`]s; everything else
//! (sessions, tasks, audit entries) is derived per run and never persisted.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Record** | One normalized log line |
//! | **Session** | All records sharing a session identifier (one log file) |
//! | **Task** | A unit of requested work, bounded by user-authored messages |
//! | **Source** | Why a session ran: user request, heartbeat, cron job, or self-initiated |
//! | **Verdict** | The auditor's classification of an autonomous session |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================
// Records
// ============================================

/// Kind of log line, from the envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    Session,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Message => "message",
            EventType::Session => "session",
            EventType::Other => "other",
        }
    }

    /// Map the envelope `type` value. Missing types are treated as messages.
    pub fn from_raw(value: Option<&str>) -> Self {
        match value {
            None | Some("message") => EventType::Message,
            Some("session") => EventType::Session,
            Some(_) => EventType::Other,
        }
    }
}

/// Author of a message line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A human-authored message
    User,
    /// The agent's own output
    Assistant,
    /// Output returned by a tool invocation
    ToolResult,
    /// Any other declared role (system, developer, ...)
    Other,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
            Role::Other => "other",
        }
    }

    /// Map a raw role string from either log schema.
    pub fn from_raw(value: &str) -> Self {
        match value {
            "user" | "human" => Role::User,
            "assistant" => Role::Assistant,
            "toolResult" | "tool_result" | "tool" => Role::ToolResult,
            _ => Role::Other,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tool invocation found in a record's content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One normalized event.
///
/// Created once per log line at ingestion; the derived fields (`text`,
/// `tool_calls`, `cost_usd`) are computed there and never change afterwards.
#[derive(Debug, Clone)]
pub struct Record {
    /// Session identifier (log file stem)
    pub session_id: String,
    /// Log file the line came from
    pub source_path: PathBuf,
    /// Envelope type
    pub event_type: EventType,
    /// Timestamp exactly as logged
    pub timestamp: Option<String>,
    /// Parsed timestamp, when the logged value is a recognizable date
    pub at: Option<DateTime<Utc>>,
    /// Message author
    pub role: Option<Role>,
    /// Stop reason reported by the model
    pub stop_reason: Option<String>,
    /// Model identifier
    pub model: Option<String>,
    /// Cost as logged, when the line carried one
    pub declared_cost: Option<f64>,
    /// Structured content blocks
    pub content: Vec<serde_json::Value>,
    /// Plain-text concatenation of text content
    pub text: String,
    /// Tool invocations found in content
    pub tool_calls: Vec<ToolCall>,
    /// The raw line, for fallback error detection
    pub raw: String,
    /// Tool result flagged as an error
    pub tool_error: bool,
    /// Error message attached to the line
    pub error_message: Option<String>,
    /// Resolved cost: declared when present, estimated otherwise
    pub cost_usd: f64,
    /// Whether `cost_usd` came from the estimator
    pub cost_estimated: bool,
}

impl Record {
    /// Calendar date prefix (`YYYY-MM-DD`) of the logged timestamp.
    pub fn date(&self) -> Option<&str> {
        self.timestamp.as_deref().and_then(date_prefix)
    }

    pub fn is_user(&self) -> bool {
        self.role == Some(Role::User)
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Some(Role::Assistant)
    }

    /// Stop reason is literally `error`.
    pub fn stopped_on_error(&self) -> bool {
        self.stop_reason.as_deref() == Some("error")
    }

    /// An error event: explicit error message or error stop reason.
    pub fn is_error_event(&self) -> bool {
        self.error_message.is_some() || self.stopped_on_error()
    }

    /// Any error signal, including tool failures.
    pub fn has_error_signal(&self) -> bool {
        self.is_error_event() || self.tool_error
    }
}

/// First 10 characters of a timestamp string, if it has that many.
pub fn date_prefix(timestamp: &str) -> Option<&str> {
    timestamp.get(..10)
}

// ============================================
// Sessions
// ============================================

/// What triggered a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    UserRequests,
    Heartbeats,
    CronJobs,
    SelfInitiated,
}

impl SessionSource {
    /// All sources, in report order.
    pub const ALL: [SessionSource; 4] = [
        SessionSource::UserRequests,
        SessionSource::Heartbeats,
        SessionSource::CronJobs,
        SessionSource::SelfInitiated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionSource::UserRequests => "user_requests",
            SessionSource::Heartbeats => "heartbeats",
            SessionSource::CronJobs => "cron_jobs",
            SessionSource::SelfInitiated => "self_initiated",
        }
    }

    pub fn is_autonomous(&self) -> bool {
        !matches!(self, SessionSource::UserRequests)
    }
}

impl std::fmt::Display for SessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_requests" => Ok(SessionSource::UserRequests),
            "heartbeats" => Ok(SessionSource::Heartbeats),
            "cron_jobs" => Ok(SessionSource::CronJobs),
            "self_initiated" => Ok(SessionSource::SelfInitiated),
            _ => Err(format!("unknown session source: {}", s)),
        }
    }
}

// ============================================
// Tasks
// ============================================

/// Outcome of an inferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed,
    InProgress,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::InProgress => "in_progress",
        }
    }
}

// ============================================
// Autonomous audit
// ============================================

/// Auditor classification of an autonomous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Helpful,
    Unnecessary,
    Partial,
    Risky,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Helpful => "helpful",
            Verdict::Unnecessary => "unnecessary",
            Verdict::Partial => "partial",
            Verdict::Risky => "risky",
        }
    }

    /// Ordering used for the notable list: risky first, helpful last.
    pub fn review_priority(&self) -> u8 {
        match self {
            Verdict::Risky => 0,
            Verdict::Partial => 1,
            Verdict::Unnecessary => 2,
            Verdict::Helpful => 3,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping_covers_both_schemas() {
        assert_eq!(Role::from_raw("user"), Role::User);
        assert_eq!(Role::from_raw("toolResult"), Role::ToolResult);
        assert_eq!(Role::from_raw("tool_result"), Role::ToolResult);
        assert_eq!(Role::from_raw("system"), Role::Other);
    }

    #[test]
    fn source_round_trips_through_str() {
        for source in SessionSource::ALL {
            assert_eq!(source.as_str().parse::<SessionSource>(), Ok(source));
        }
        assert!(!SessionSource::UserRequests.is_autonomous());
        assert!(SessionSource::CronJobs.is_autonomous());
    }

    #[test]
    fn review_priority_puts_risky_first() {
        let mut verdicts = [
            Verdict::Helpful,
            Verdict::Unnecessary,
            Verdict::Risky,
            Verdict::Partial,
        ];
        verdicts.sort_by_key(Verdict::review_priority);
        assert_eq!(
            verdicts,
            [
                Verdict::Risky,
                Verdict::Partial,
                Verdict::Unnecessary,
                Verdict::Helpful
            ]
        );
    }

    #[test]
    fn date_prefix_requires_ten_chars() {
        assert_eq!(date_prefix("2026-02-14T03:00:00Z"), Some("2026-02-14"));
        assert_eq!(date_prefix("2026-02"), None);
    }

    #[test]
    fn event_type_defaults_to_message() {
        assert_eq!(EventType::from_raw(None), EventType::Message);
        assert_eq!(EventType::from_raw(Some("session")), EventType::Session);
        assert_eq!(EventType::from_raw(Some("compaction")), EventType::Other);
    }
}
