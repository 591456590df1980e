//! Task segmentation.
//!
//! A task starts at a user-authored record and runs up to, but not including,
//! the next user-authored record in the same session (or the session end).
//! Sessions without any user record produce no tasks.

use crate::analytics::sessions::Session;
use crate::format::{format_timestamp_opt, ratio, round_rate, round_usd, summarize_text};
use crate::types::{Record, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Marker used as failure reason when only a tool result flagged the error.
pub const TOOL_ERROR_REASON: &str = "tool_error";

/// Completed tasks kept in the highlight list (failed tasks are always kept).
const HIGHLIGHT_COMPLETED: usize = 5;

const SUMMARY_CHARS: usize = 80;

/// One inferred unit of requested work.
#[derive(Debug, Clone)]
pub struct Task<'a> {
    pub session_id: &'a str,
    pub summary: String,
    pub status: TaskStatus,
    pub duration_seconds: Option<i64>,
    pub model: String,
    pub cost_usd: f64,
    pub tool_calls: usize,
    pub ended_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

/// Split every session into task chains.
pub fn segment_tasks<'a>(sessions: &[Session<'a>]) -> Vec<Task<'a>> {
    let mut tasks = Vec::new();
    for session in sessions {
        let starts: Vec<usize> = session
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_user())
            .map(|(i, _)| i)
            .collect();

        for (n, &start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(session.records.len());
            tasks.push(build_task(session.id, &session.records[start..end]));
        }
    }
    tasks
}

fn build_task<'a>(session_id: &'a str, chain: &[&Record]) -> Task<'a> {
    let trigger = chain[0];

    let status = if chain.iter().any(|r| r.has_error_signal()) {
        TaskStatus::Failed
    } else if chain.iter().any(|r| r.is_assistant()) {
        TaskStatus::Completed
    } else {
        TaskStatus::InProgress
    };

    let first_at = chain.iter().find_map(|r| r.at);
    let last_assistant_at = chain
        .iter()
        .rev()
        .filter(|r| r.is_assistant())
        .find_map(|r| r.at);
    let duration_seconds = match (first_at, last_assistant_at) {
        (Some(start), Some(end)) if end >= start => Some((end - start).num_seconds()),
        _ => None,
    };

    let model = chain
        .iter()
        .rev()
        .filter(|r| r.is_assistant())
        .find_map(|r| r.model.as_deref().filter(|m| !m.is_empty()))
        .or_else(|| trigger.model.as_deref().filter(|m| !m.is_empty()))
        .unwrap_or("unknown")
        .to_string();

    let failure_reason = chain
        .iter()
        .find_map(|r| r.error_message.clone().filter(|m| !m.is_empty()))
        .or_else(|| {
            chain
                .iter()
                .any(|r| r.tool_error)
                .then(|| TOOL_ERROR_REASON.to_string())
        });

    let summary = summarize_text(&trigger.text, SUMMARY_CHARS);

    Task {
        session_id,
        summary: if summary.is_empty() {
            "(untitled task)".to_string()
        } else {
            summary
        },
        status,
        duration_seconds,
        model,
        cost_usd: chain.iter().map(|r| r.cost_usd).sum(),
        tool_calls: chain.iter().map(|r| r.tool_calls.len()).sum(),
        ended_at: chain.iter().filter_map(|r| r.at).max(),
        failure_reason,
    }
}

/// One entry of the `tasks.highlights` list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskHighlight {
    pub summary: String,
    pub status: TaskStatus,
    pub duration_seconds: Option<i64>,
    pub model: String,
    pub cost_usd: f64,
    pub tool_calls: usize,
    pub ended_at: Option<String>,
    pub failure_reason: Option<String>,
}

impl From<&Task<'_>> for TaskHighlight {
    fn from(task: &Task<'_>) -> Self {
        Self {
            summary: task.summary.clone(),
            status: task.status,
            duration_seconds: task.duration_seconds,
            model: task.model.clone(),
            cost_usd: round_usd(task.cost_usd),
            tool_calls: task.tool_calls,
            ended_at: format_timestamp_opt(task.ended_at),
            failure_reason: task.failure_reason.clone(),
        }
    }
}

/// Counts for the `tasks` report section (trend is filled in by the engine).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TaskCounts {
    pub asked: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
    pub completion_rate: f64,
    pub highlights: Vec<TaskHighlight>,
}

/// Count task outcomes and pick the highlight list.
pub fn summarize(tasks: &[Task<'_>]) -> TaskCounts {
    let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
    let asked = tasks.len();
    let completed = count(TaskStatus::Completed);

    TaskCounts {
        asked,
        completed,
        failed: count(TaskStatus::Failed),
        in_progress: count(TaskStatus::InProgress),
        completion_rate: round_rate(ratio(completed as f64, asked as f64)),
        highlights: highlights(tasks).into_iter().map(TaskHighlight::from).collect(),
    }
}

/// The most recently ended completed tasks plus every failed task, newest first.
pub fn highlights<'t, 'a>(tasks: &'t [Task<'a>]) -> Vec<&'t Task<'a>> {
    let mut completed: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();
    completed.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
    completed.truncate(HIGHLIGHT_COMPLETED);

    let mut picked: Vec<&Task> = completed;
    picked.extend(tasks.iter().filter(|t| t.status == TaskStatus::Failed));
    picked.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
    picked
}
