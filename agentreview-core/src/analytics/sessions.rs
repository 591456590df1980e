//! Session reconstruction.
//!
//! Records are put in time order first and grouped second. Both steps are
//! separate functions because task segmentation and tool-chain detection
//! depend on the exact resulting order.
//!
//! Ordering rule: parsed timestamps are compared as normalized UTC instants.
//! A timestamp that does not parse is compared by its raw text against the
//! normalized form of the others. Records with no timestamp at all sort first.
//! The sort is stable, so ties keep their file order.

use crate::types::{Record, SessionSource};
use chrono::{DateTime, Utc};

/// All records sharing one session identifier, in time order.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    pub id: &'a str,
    pub records: Vec<&'a Record>,
    pub source: SessionSource,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl<'a> Session<'a> {
    fn new(id: &'a str, records: Vec<&'a Record>) -> Self {
        let has_user = records.iter().any(|r| r.is_user());
        let source = classify_source(has_user, id);
        let started_at = records.iter().filter_map(|r| r.at).min();
        let ended_at = records.iter().filter_map(|r| r.at).max();
        Self {
            id,
            records,
            source,
            started_at,
            ended_at,
        }
    }

    /// Timestamp of the session's first record, as logged.
    pub fn first_timestamp(&self) -> Option<&'a str> {
        self.records.iter().find_map(|r| r.timestamp.as_deref())
    }

    /// Number of tool invocations across the session.
    pub fn tool_call_count(&self) -> usize {
        self.records.iter().map(|r| r.tool_calls.len()).sum()
    }
}

/// Classify what triggered a session.
///
/// Any user-authored message makes it a user request. Otherwise the session
/// key is checked (case-insensitive) for `heartbeat`, then `cron`. Everything
/// else falls into `self_initiated`, which is a catch-all heuristic: sessions
/// from schedulers with other naming conventions land there too.
pub fn classify_source(has_user_message: bool, session_id: &str) -> SessionSource {
    if has_user_message {
        return SessionSource::UserRequests;
    }
    let key = session_id.to_lowercase();
    if key.contains("heartbeat") {
        SessionSource::Heartbeats
    } else if key.contains("cron") {
        SessionSource::CronJobs
    } else {
        SessionSource::SelfInitiated
    }
}

/// Stable sort by timestamp; records without one sort first.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by_cached_key(sort_key);
}

fn sort_key(record: &Record) -> Option<String> {
    match record.at {
        Some(at) => Some(at.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()),
        None => record.timestamp.as_deref().map(|raw| raw.trim().to_string()),
    }
}

/// Group time-sorted records by session, preserving first-seen session order.
pub fn group_sessions(records: &[Record]) -> Vec<Session<'_>> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: std::collections::HashMap<&str, Vec<&Record>> =
        std::collections::HashMap::new();

    for record in records {
        let id = record.session_id.as_str();
        grouped
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .filter_map(|id| grouped.remove(id).map(|records| Session::new(id, records)))
        .collect()
}
