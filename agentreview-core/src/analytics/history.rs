//! Prior weekly snapshots.
//!
//! Snapshots are earlier reports written by this tool, kept in a history
//! directory as `*week*.json`. They are loaded once, ordered by the week
//! number embedded in the file name, and handed to the rating and trend stages
//! as a read-only slice.

use crate::analytics::rating::tier_for_rate;
use crate::error::{Error, Result};
use crate::format::{round_pct, round_usd};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static WEEK_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)week[-_]?(\d+)").expect("WEEK_NUMBER: compile-time constant")
});

/// Snapshots considered for trend lines.
pub const TREND_WEEKS: usize = 8;

/// The fields of a prior report the engine compares against.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub week: u32,
    pub path: PathBuf,
    pub title: Option<String>,
    pub tier_index: usize,
    /// 0..1
    pub completion_rate: f64,
    pub total_usd: f64,
    /// 0..1
    pub error_rate: f64,
}

/// Week number embedded in a snapshot file name.
pub fn week_number(file_name: &str) -> Option<u32> {
    WEEK_NUMBER
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract a snapshot from a prior report document.
pub fn snapshot_from_report(path: &Path, week: u32, doc: &Value) -> Result<Snapshot> {
    if !doc.is_object() {
        return Err(Error::Snapshot {
            path: path.to_path_buf(),
            message: "report is not a JSON object".to_string(),
        });
    }

    let number = |pointer: &str| doc.pointer(pointer).and_then(Value::as_f64).filter(|v| v.is_finite());

    let completion_rate = number("/rating/task_completion_rate")
        .or_else(|| number("/tasks/completion_rate"))
        .unwrap_or(0.0);
    let tier_index = doc
        .pointer("/rating/tier_index")
        .and_then(Value::as_u64)
        .map(|i| i as usize)
        .unwrap_or_else(|| tier_for_rate(completion_rate).index);

    Ok(Snapshot {
        week,
        path: path.to_path_buf(),
        title: doc
            .pointer("/rating/title")
            .and_then(Value::as_str)
            .map(str::to_string),
        tier_index,
        completion_rate,
        total_usd: number("/cost/total_usd").unwrap_or(0.0),
        error_rate: number("/health/error_rate").unwrap_or(0.0),
    })
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let week = week_number(&file_name).ok_or_else(|| Error::Snapshot {
        path: path.to_path_buf(),
        message: "file name carries no week number".to_string(),
    })?;
    let text = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&text).map_err(|e| Error::Snapshot {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    snapshot_from_report(path, week, &doc)
}

/// Load every usable snapshot in `dir`, oldest week first.
///
/// A missing directory means no history. Individual bad files are skipped
/// with a warning.
pub fn load_history(dir: &Path) -> Result<Vec<Snapshot>> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no history directory");
        return Ok(Vec::new());
    }

    let pattern = format!("{}/*week*.json", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| Error::Config(format!("invalid history pattern: {}", e)))?;

    let mut snapshots = Vec::new();
    for path in entries.flatten() {
        match load_snapshot(&path) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping history snapshot");
            }
        }
    }

    snapshots.sort_by(|a, b| a.week.cmp(&b.week).then_with(|| a.path.cmp(&b.path)));
    tracing::debug!(count = snapshots.len(), "loaded history snapshots");
    Ok(snapshots)
}

/// One point on a weekly trend line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub week: u32,
    pub value: f64,
}

/// Trend series over the most recent snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trends {
    /// Weekly total cost in USD
    pub cost: Vec<TrendPoint>,
    /// Weekly completion percentage
    pub completion: Vec<TrendPoint>,
    /// Weekly error-rate percentage
    pub error_rate: Vec<TrendPoint>,
}

pub fn trends(history: &[Snapshot]) -> Trends {
    let recent = &history[history.len().saturating_sub(TREND_WEEKS)..];
    let series = |f: fn(&Snapshot) -> f64| -> Vec<TrendPoint> {
        recent
            .iter()
            .map(|s| TrendPoint {
                week: s.week,
                value: f(s),
            })
            .collect()
    };
    Trends {
        cost: series(|s| round_usd(s.total_usd)),
        completion: series(|s| round_pct(s.completion_rate * 100.0)),
        error_rate: series(|s| round_pct(s.error_rate * 100.0)),
    }
}
