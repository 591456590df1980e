//! Analysis pipeline
//!
//! Turns an ingested record stream into a [`Report`]. Each stage is a plain
//! function over the session list; the engine only fixes their order.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   sort + group   ┌──────────────┐
//! │ IngestResult │ ───────────────► │   Sessions   │
//! └──────────────┘                  └──────┬───────┘
//!                                          │
//!          ┌───────────┬───────────┬───────┼───────────┬───────────┐
//!          ▼           ▼           ▼       ▼           ▼           ▼
//!       tasks        cost     autonomous  skills     health      rating
//!          │           │           │       │           │      (+ history)
//!          └───────────┴───────────┴───┬───┴───────────┴───────────┘
//!                                      ▼
//!                                   Report
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentreview_core::analytics::{analyze, AnalysisContext};
//!
//! let ingest = coordinator.ingest()?;
//! let context = AnalysisContext::new(coordinator.sessions_dir(), filter);
//! let report = analyze(ingest, &context);
//! println!("{}", report.to_json(true)?);
//! ```
//!
//! Output is a pure function of the ingest result and the context: the same
//! inputs and the same `generated_at` produce byte-identical JSON.

use crate::analytics::history::{trends, Snapshot};
use crate::analytics::report::{
    CostSection, HealthSection, Meta, Period, Report, TasksSection,
};
use crate::analytics::{autonomous, cost, health, rating, sessions, skills, tasks};
use crate::format::format_timestamp;
use crate::ingest::{DateFilter, IngestResult};
use crate::types::Record;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

/// Everything an analysis run needs besides the records.
///
/// History and installed skills are injected here rather than read by the
/// stages themselves.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub generated_at: DateTime<Utc>,
    pub filter: DateFilter,
    pub agent_id: String,
    pub hostname: String,
    pub sessions_dir: PathBuf,
    pub installed_skills: Vec<String>,
    /// Prior snapshots, oldest first
    pub history: Vec<Snapshot>,
}

impl AnalysisContext {
    pub fn new(sessions_dir: &Path, filter: DateFilter) -> Self {
        Self {
            generated_at: Utc::now(),
            filter,
            agent_id: "main".to_string(),
            hostname: local_hostname(),
            sessions_dir: sessions_dir.to_path_buf(),
            installed_skills: Vec::new(),
            history: Vec::new(),
        }
    }
}

/// Run every stage and assemble the report.
pub fn analyze(ingest: IngestResult, ctx: &AnalysisContext) -> Report {
    let IngestResult {
        mut records,
        diagnostics,
        ..
    } = ingest;

    sessions::sort_records(&mut records);
    let sessions = sessions::group_sessions(&records);
    tracing::debug!(
        records = records.len(),
        sessions = sessions.len(),
        "sessions reconstructed"
    );

    let all_tasks = tasks::segment_tasks(&sessions);
    let task_counts = tasks::summarize(&all_tasks);
    let cost_totals = cost::summarize(&sessions, task_counts.completed);
    let autonomous = autonomous::summarize(&sessions);
    let tool_names = records
        .iter()
        .flat_map(|r| r.tool_calls.iter().map(|c| c.name.as_str()));
    let skills = skills::summarize(&ctx.installed_skills, tool_names);
    let health_totals = health::summarize(&sessions);
    let rating = rating::rate(task_counts.completion_rate, &ctx.history);
    let trend = trends(&ctx.history);

    tracing::info!(
        tasks = task_counts.asked,
        completed = task_counts.completed,
        autonomous_sessions = autonomous.sessions,
        total_usd = cost_totals.total_usd,
        rating = %rating.title,
        "analysis complete"
    );

    Report {
        meta: Meta {
            generated_at: format_timestamp(ctx.generated_at),
            period: period(&ctx.filter, &records),
            agent_id: ctx.agent_id.clone(),
            hostname: ctx.hostname.clone(),
            sessions_dir: ctx.sessions_dir.display().to_string(),
            ingestion: diagnostics,
        },
        cost: CostSection {
            totals: cost_totals,
            trend: trend.cost,
        },
        tasks: TasksSection {
            counts: task_counts,
            trend: trend.completion,
        },
        autonomous,
        skills,
        health: HealthSection {
            totals: health_totals,
            error_rate_trend: trend.error_rate,
        },
        rating,
    }
}

/// The reported window: the requested bounds, or the observed dates for `--all`.
fn period(filter: &DateFilter, records: &[Record]) -> Period {
    let (start, end) = match filter {
        DateFilter::Range { since, until } => (Some(*since), Some(*until)),
        DateFilter::All => {
            let dates = records
                .iter()
                .filter_map(|r| r.date())
                .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let (min, max) = dates.fold((None, None), |(min, max): (Option<NaiveDate>, Option<NaiveDate>), d| {
                (
                    Some(min.map_or(d, |m| m.min(d))),
                    Some(max.map_or(d, |m| m.max(d))),
                )
            });
            (min, max)
        }
    };

    let days = match (start, end) {
        (Some(s), Some(e)) if e >= s => (e - s).num_days() + 1,
        _ => 0,
    };

    Period {
        start: start.map(|d| d.format("%Y-%m-%d").to_string()),
        end: end.map(|d| d.format("%Y-%m-%d").to_string()),
        days,
    }
}

/// Host name for `meta.hostname`, or `unknown`.
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
