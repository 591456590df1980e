//! Autonomous action auditor.
//!
//! Every session that was not started by a user gets one [`AuditEntry`] with
//! a verdict. Verdict precedence, first match wins:
//!
//! 1. `risky`: a write touched a sensitive path
//! 2. `helpful`: wrote something, nothing was reverted, no errors
//! 3. `partial`: any error signal
//! 4. `unnecessary`: everything else

use crate::analytics::heuristics::{
    extract_paths, is_sensitive_path, is_write_tool, mentions_revert,
};
use crate::analytics::sessions::Session;
use crate::format::{ratio, round_rate, summarize_text};
use crate::types::{SessionSource, Verdict};
use chrono::Timelike;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Entries listed under `autonomous.notable`.
const NOTABLE_LIMIT: usize = 5;

/// UTC hour that marks the late-night cohort.
const LATE_NIGHT_HOUR: u32 = 3;

const SUMMARY_CHARS: usize = 100;

/// Audit of one autonomous session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditEntry {
    pub timestamp: Option<String>,
    pub session: String,
    pub summary: String,
    pub tools: Vec<String>,
    pub actions: usize,
    pub paths_touched: usize,
    pub paths: Vec<String>,
    pub verdict: Verdict,
    #[serde(skip)]
    pub source: SessionSource,
    #[serde(skip)]
    pub late_night: bool,
    #[serde(skip)]
    pub flags: AuditFlags,
}

/// Signals the verdict is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditFlags {
    pub writes: bool,
    pub risky: bool,
    pub reverted: bool,
    pub has_error: bool,
}

impl AuditFlags {
    pub fn verdict(&self) -> Verdict {
        if self.risky {
            Verdict::Risky
        } else if self.writes && !self.reverted && !self.has_error {
            Verdict::Helpful
        } else if self.has_error {
            Verdict::Partial
        } else {
            Verdict::Unnecessary
        }
    }
}

/// Audit one session. Returns `None` for user-requested sessions.
pub fn audit_session(session: &Session<'_>) -> Option<AuditEntry> {
    if !session.source.is_autonomous() {
        return None;
    }

    let mut tools = BTreeSet::new();
    let mut raw_paths = Vec::new();
    let mut writes = false;
    let mut texts = Vec::new();

    for record in &session.records {
        for call in &record.tool_calls {
            tools.insert(call.name.clone());
            writes |= is_write_tool(&call.name);
            extract_paths(&call.arguments, &mut raw_paths);
        }
        if !record.text.is_empty() {
            texts.push(record.text.as_str());
        }
    }

    let mut seen = HashSet::new();
    let paths: Vec<String> = raw_paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect();

    let flags = AuditFlags {
        writes,
        risky: writes && paths.iter().any(|p| is_sensitive_path(p)),
        reverted: mentions_revert(&texts.join("\n")),
        has_error: session.records.iter().any(|r| r.has_error_signal()),
    };
    let actions = session.tool_call_count();

    let summary = session
        .records
        .iter()
        .filter(|r| r.is_assistant() && !r.text.trim().is_empty())
        .map(|r| summarize_text(&r.text, SUMMARY_CHARS))
        .next()
        .unwrap_or_else(|| format!("{} session ({} actions)", session.source, actions));

    Some(AuditEntry {
        timestamp: session.first_timestamp().map(str::to_string),
        session: session.id.to_string(),
        summary,
        tools: tools.into_iter().collect(),
        actions,
        paths_touched: paths.len(),
        paths,
        verdict: flags.verdict(),
        source: session.source,
        late_night: session
            .started_at
            .is_some_and(|at| at.hour() == LATE_NIGHT_HOUR),
        flags,
    })
}

/// Totals for the `autonomous` report section.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AutonomousSummary {
    pub sessions: usize,
    pub total_actions: usize,
    pub useful_count: usize,
    pub useful_rate: f64,
    pub helpful_count: usize,
    pub partial_count: usize,
    pub unnecessary_count: usize,
    pub risky_count: usize,
    pub three_am_sessions: usize,
    pub three_am_useful: usize,
    pub heartbeat_sessions: usize,
    pub heartbeat_useful_rate: f64,
    pub notable: Vec<AuditEntry>,
}

/// Audit every autonomous session and aggregate the results.
pub fn summarize(sessions: &[Session<'_>]) -> AutonomousSummary {
    let entries: Vec<AuditEntry> = sessions.iter().filter_map(audit_session).collect();
    summarize_entries(entries)
}

fn summarize_entries(entries: Vec<AuditEntry>) -> AutonomousSummary {
    let count = |verdict: Verdict| entries.iter().filter(|e| e.verdict == verdict).count();
    let total_actions: usize = entries.iter().map(|e| e.actions).sum();
    let useful_count: usize = entries
        .iter()
        .filter(|e| is_helpful(e))
        .map(|e| e.actions)
        .sum();

    let late_night: Vec<&AuditEntry> = entries.iter().filter(|e| e.late_night).collect();
    let heartbeats: Vec<&AuditEntry> = entries
        .iter()
        .filter(|e| e.source == SessionSource::Heartbeats)
        .collect();
    let heartbeat_helpful = heartbeats.iter().filter(|e| is_helpful(e)).count();

    let mut summary = AutonomousSummary {
        sessions: entries.len(),
        total_actions,
        useful_count,
        useful_rate: round_rate(ratio(useful_count as f64, total_actions as f64)),
        helpful_count: count(Verdict::Helpful),
        partial_count: count(Verdict::Partial),
        unnecessary_count: count(Verdict::Unnecessary),
        risky_count: count(Verdict::Risky),
        three_am_sessions: late_night.len(),
        three_am_useful: late_night.iter().filter(|e| is_helpful(e)).count(),
        heartbeat_sessions: heartbeats.len(),
        heartbeat_useful_rate: round_rate(ratio(
            heartbeat_helpful as f64,
            heartbeats.len() as f64,
        )),
        notable: Vec::new(),
    };

    summary.notable = notable(entries);
    summary
}

fn is_helpful(entry: &AuditEntry) -> bool {
    entry.verdict == Verdict::Helpful
}

/// Highest review priority first, newest first within a priority.
fn notable(mut entries: Vec<AuditEntry>) -> Vec<AuditEntry> {
    entries.sort_by(|a, b| {
        a.verdict
            .review_priority()
            .cmp(&b.verdict.review_priority())
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
    entries.truncate(NOTABLE_LIMIT);
    entries
}
