//! Operational health metrics over the selected records.

use crate::analytics::heuristics::{
    is_read_tool, is_write_tool, mentions_compaction, mentions_context_overflow,
};
use crate::analytics::sessions::Session;
use crate::format::{ratio, round_rate, round_seconds};
use crate::types::Record;
use serde::Serialize;

/// Health totals (trend is filled in by the engine).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct HealthTotals {
    pub errors_total: usize,
    pub errors_self_caused: usize,
    pub errors_in_user_tasks: usize,
    pub error_rate: f64,
    pub tool_failures: usize,
    pub context_overflows: usize,
    pub compactions: usize,
    pub avg_response_seconds: f64,
    pub longest_tool_chain: usize,
    pub read_calls: usize,
    pub write_calls: usize,
    pub read_write_ratio: u64,
}

pub fn summarize(sessions: &[Session<'_>]) -> HealthTotals {
    let mut totals = HealthTotals::default();
    let mut records_seen = 0usize;
    let mut latencies = Vec::new();

    for session in sessions {
        records_seen += session.records.len();
        for record in &session.records {
            if record.is_error_event() {
                totals.errors_total += 1;
                if session.source.is_autonomous() {
                    totals.errors_self_caused += 1;
                } else {
                    totals.errors_in_user_tasks += 1;
                }
            }
            if record.tool_error {
                totals.tool_failures += 1;
            }
            if record_mentions(record, mentions_context_overflow) {
                totals.context_overflows += 1;
            }
            if record_mentions(record, mentions_compaction) {
                totals.compactions += 1;
            }
            for call in &record.tool_calls {
                if is_read_tool(&call.name) {
                    totals.read_calls += 1;
                } else if is_write_tool(&call.name) {
                    totals.write_calls += 1;
                }
            }
        }
        totals.longest_tool_chain = totals
            .longest_tool_chain
            .max(longest_tool_chain(&session.records));
        latencies.extend(response_latencies(&session.records));
    }

    totals.error_rate = round_rate(ratio(totals.errors_total as f64, records_seen as f64));
    totals.avg_response_seconds = round_seconds(ratio(
        latencies.iter().sum::<f64>(),
        latencies.len() as f64,
    ));
    totals.read_write_ratio = read_write_ratio(totals.read_calls, totals.write_calls);
    totals
}

fn record_mentions(record: &Record, predicate: fn(&str) -> bool) -> bool {
    predicate(&record.text) || record.error_message.as_deref().is_some_and(predicate)
}

/// Longest run of consecutive records that each carry at least one tool call.
pub fn longest_tool_chain(records: &[&Record]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for record in records {
        if record.tool_calls.is_empty() {
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// Seconds from each user message to the next assistant reply.
///
/// A later user message replaces a pending one, and an untimed one clears
/// it. Negative deltas are dropped.
pub fn response_latencies(records: &[&Record]) -> Vec<f64> {
    let mut pending = None;
    let mut out = Vec::new();
    for record in records {
        if record.is_user() {
            pending = record.at;
        } else if record.is_assistant() {
            if let (Some(asked), Some(answered)) = (pending, record.at) {
                let delta = (answered - asked).num_milliseconds() as f64 / 1000.0;
                if delta >= 0.0 {
                    out.push(delta);
                }
                pending = None;
            }
        }
    }
    out
}

/// `floor(read / write)` when there are writes, else the read count.
pub fn read_write_ratio(read: usize, write: usize) -> u64 {
    if write > 0 {
        (read / write) as u64
    } else {
        read as u64
    }
}
