//! Pilot scorecard: before/after comparison of two reports.
//!
//! Reads two report documents (typically a baseline week and the current
//! week), extracts five headline metrics, and scores how many moved in the
//! right direction.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Baselines closer to zero than this have no meaningful relative change.
const DELTA_PCT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Usd,
    Pct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::LowerIsBetter => "lower_is_better",
            Direction::HigherIsBetter => "higher_is_better",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreVerdict {
    StrongImprovement,
    Improving,
    Mixed,
    Regressing,
}

impl ScoreVerdict {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            ScoreVerdict::StrongImprovement
        } else if score >= 60 {
            ScoreVerdict::Improving
        } else if score >= 40 {
            ScoreVerdict::Mixed
        } else {
            ScoreVerdict::Regressing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreVerdict::StrongImprovement => "strong_improvement",
            ScoreVerdict::Improving => "improving",
            ScoreVerdict::Mixed => "mixed",
            ScoreVerdict::Regressing => "regressing",
        }
    }
}

/// Compared metrics: (key, label, unit, direction).
const METRICS: [(&str, &str, Unit, Direction); 5] = [
    ("total_cost_usd", "Total Cost", Unit::Usd, Direction::LowerIsBetter),
    ("heartbeat_cost_share_pct", "Heartbeat Cost Share", Unit::Pct, Direction::LowerIsBetter),
    ("completion_rate_pct", "Task Completion Rate", Unit::Pct, Direction::HigherIsBetter),
    ("error_rate_pct", "Error Rate", Unit::Pct, Direction::LowerIsBetter),
    ("autonomous_useful_rate_pct", "Autonomous Useful Rate", Unit::Pct, Direction::HigherIsBetter),
];

// ============================================
// Metric extraction
// ============================================

/// Headline metrics of one report, in [`METRICS`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlineMetrics([f64; 5]);

impl HeadlineMetrics {
    pub fn get(&self, key: &str) -> Option<f64> {
        METRICS
            .iter()
            .position(|(k, ..)| *k == key)
            .map(|i| self.0[i])
    }
}

/// Lenient numeric read: numbers, booleans and numeric strings; else 0.
fn number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Rates stored as 0..1 become percentages; negatives clamp to 0.
pub fn normalize_pct(value: f64) -> f64 {
    let pct = if value <= 1.0 { value * 100.0 } else { value };
    pct.max(0.0)
}

pub fn extract_metrics(doc: &Value) -> HeadlineMetrics {
    let at = |pointer: &str| number(doc.pointer(pointer));

    let asked = at("/tasks/asked").max(1.0);
    let mut error_rate = at("/health/error_rate");
    if error_rate <= 0.0 {
        error_rate = at("/health/errors_total") / asked;
    }

    HeadlineMetrics([
        at("/cost/total_usd"),
        normalize_pct(at("/cost/by_source/heartbeats/pct")),
        normalize_pct(at("/tasks/completion_rate")),
        normalize_pct(error_rate),
        normalize_pct(at("/autonomous/useful_rate")),
    ])
}

// ============================================
// Scorecard
// ============================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricRow {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: Unit,
    pub direction: Direction,
    pub baseline: f64,
    pub current: f64,
    pub delta: f64,
    pub delta_pct: Option<f64>,
    pub improved: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScorecardSummary {
    pub improved_metrics: usize,
    pub total_metrics: usize,
    pub score: u32,
    pub verdict: ScoreVerdict,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WindowRef {
    pub path: String,
    pub period: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Scorecard {
    pub baseline: WindowRef,
    pub current: WindowRef,
    pub summary: ScorecardSummary,
    pub metrics: Vec<MetricRow>,
}

/// Compare two sets of headline metrics.
pub fn build_rows(baseline: &HeadlineMetrics, current: &HeadlineMetrics) -> Vec<MetricRow> {
    METRICS
        .iter()
        .enumerate()
        .map(|(i, &(key, label, unit, direction))| {
            let base = baseline.0[i];
            let curr = current.0[i];
            let delta = curr - base;
            MetricRow {
                key,
                label,
                unit,
                direction,
                baseline: base,
                current: curr,
                delta,
                delta_pct: (base.abs() >= DELTA_PCT_EPSILON).then(|| delta / base * 100.0),
                improved: match direction {
                    Direction::LowerIsBetter => curr < base,
                    Direction::HigherIsBetter => curr > base,
                },
            }
        })
        .collect()
}

pub fn summarize(rows: &[MetricRow]) -> ScorecardSummary {
    let improved = rows.iter().filter(|r| r.improved).count();
    let total = rows.len().max(1);
    let score = (improved as f64 / total as f64 * 100.0).round() as u32;
    ScorecardSummary {
        improved_metrics: improved,
        total_metrics: rows.len(),
        score,
        verdict: ScoreVerdict::from_score(score),
    }
}

/// `start -> end` from a report's `meta.period`, or `unknown`.
pub fn period_label(doc: &Value) -> String {
    let bound = |key: &str| {
        doc.pointer(&format!("/meta/period/{key}"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    match (bound("start"), bound("end")) {
        (Some(start), Some(end)) => format!("{start} -> {end}"),
        _ => "unknown".to_string(),
    }
}

/// Read a report document; the root must be a JSON object.
pub fn load_report(path: &Path) -> Result<Value> {
    let snapshot_error = |message: String| Error::Snapshot {
        path: path.to_path_buf(),
        message,
    };
    if !path.exists() {
        return Err(snapshot_error("analysis file does not exist".to_string()));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| snapshot_error(format!("failed reading analysis file: {e}")))?;
    let doc: Value = serde_json::from_str(&text)
        .map_err(|e| snapshot_error(format!("analysis file is not valid JSON: {e}")))?;
    if !doc.is_object() {
        return Err(snapshot_error("analysis root must be a JSON object".to_string()));
    }
    Ok(doc)
}

/// Build a scorecard from two parsed reports.
pub fn build(
    baseline_path: &Path,
    baseline: &Value,
    current_path: &Path,
    current: &Value,
) -> Scorecard {
    let rows = build_rows(&extract_metrics(baseline), &extract_metrics(current));
    Scorecard {
        baseline: WindowRef {
            path: baseline_path.display().to_string(),
            period: period_label(baseline),
        },
        current: WindowRef {
            path: current_path.display().to_string(),
            period: period_label(current),
        },
        summary: summarize(&rows),
        metrics: rows,
    }
}

/// Load both reports and build the scorecard.
pub fn build_from_files(baseline_path: &Path, current_path: &Path) -> Result<Scorecard> {
    let baseline = load_report(baseline_path)?;
    let current = load_report(current_path)?;
    Ok(build(baseline_path, &baseline, current_path, &current))
}

// ============================================
// Rendering
// ============================================

impl Scorecard {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)? + "\n")
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# Pilot Impact Scorecard".to_string(),
            String::new(),
            format!("- Baseline window: {}", self.baseline.period),
            format!("- Current window: {}", self.current.period),
            format!(
                "- Score: {}/100 ({}/{} metrics improved)",
                self.summary.score, self.summary.improved_metrics, self.summary.total_metrics
            ),
            format!("- Verdict: `{}`", self.summary.verdict.as_str()),
            String::new(),
            "| Metric | Baseline | Current | Delta | Delta % | Direction | Status |".to_string(),
            "|---|---:|---:|---:|---:|---|---|".to_string(),
        ];
        for row in &self.metrics {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                row.label,
                format_value(row.baseline, row.unit),
                format_value(row.current, row.unit),
                format_delta(row.delta, row.unit),
                format_delta_pct(row.delta_pct),
                row.direction.as_str(),
                if row.improved { "improved" } else { "not improved" },
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// `1234.5` -> `1,234.50`
fn with_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{grouped}.{frac}")
}

fn format_value(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Usd if value < 0.0 => format!("-${}", with_thousands(value)),
        Unit::Usd => format!("${}", with_thousands(value)),
        Unit::Pct => format!("{value:.1}%"),
    }
}

fn format_delta(value: f64, unit: Unit) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    match unit {
        Unit::Usd => format!("{sign}${}", with_thousands(value)),
        Unit::Pct => format!("{sign}{:.1}pp", value.abs()),
    }
}

fn format_delta_pct(value: Option<f64>) -> String {
    match value {
        None => "n/a".to_string(),
        Some(v) => {
            let sign = if v >= 0.0 { "+" } else { "-" };
            format!("{sign}{:.1}%", v.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(total: f64, hb_pct: f64, completion: f64, error_rate: f64, useful: f64) -> Value {
        json!({
            "meta": {"period": {"start": "2026-02-08", "end": "2026-02-14"}},
            "cost": {"total_usd": total, "by_source": {"heartbeats": {"pct": hb_pct}}},
            "tasks": {"asked": 10, "completion_rate": completion},
            "health": {"error_rate": error_rate, "errors_total": 3},
            "autonomous": {"useful_rate": useful}
        })
    }

    #[test]
    fn pct_normalization() {
        assert_eq!(normalize_pct(0.42), 42.0);
        assert_eq!(normalize_pct(1.0), 100.0);
        assert_eq!(normalize_pct(55.0), 55.0);
        assert_eq!(normalize_pct(-0.3), 0.0);
    }

    #[test]
    fn error_rate_falls_back_to_errors_per_task() {
        let metrics = extract_metrics(&report(1.0, 10.0, 0.5, 0.0, 0.5));
        let error_pct = metrics.get("error_rate_pct").unwrap();
        assert!((error_pct - 30.0).abs() < 1e-9);
        assert_eq!(metrics.get("heartbeat_cost_share_pct"), Some(10.0));
        assert_eq!(metrics.get("nope"), None);
    }

    #[test]
    fn every_metric_improved() {
        let baseline = report(100.0, 40.0, 0.5, 0.2, 0.3);
        let current = report(60.0, 20.0, 0.8, 0.1, 0.6);
        let card = build(Path::new("a.json"), &baseline, Path::new("b.json"), &current);

        assert_eq!(card.summary.improved_metrics, 5);
        assert_eq!(card.summary.score, 100);
        assert_eq!(card.summary.verdict, ScoreVerdict::StrongImprovement);
        assert_eq!(card.metrics[0].delta, -40.0);
        assert_eq!(card.metrics[0].delta_pct, Some(-40.0));
        assert_eq!(card.baseline.period, "2026-02-08 -> 2026-02-14");
    }

    #[test]
    fn zero_baseline_has_no_relative_delta() {
        let baseline = report(0.0, 0.0, 0.0, 0.0, 0.0);
        let current = report(0.0, 0.0, 0.0, 0.0, 0.0);
        let card = build(Path::new("a.json"), &baseline, Path::new("b.json"), &current);
        assert!(card.metrics.iter().all(|m| !m.improved));
        assert_eq!(card.metrics[0].delta_pct, None);
        assert_eq!(card.summary.verdict, ScoreVerdict::Regressing);
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(ScoreVerdict::from_score(100), ScoreVerdict::StrongImprovement);
        assert_eq!(ScoreVerdict::from_score(80), ScoreVerdict::StrongImprovement);
        assert_eq!(ScoreVerdict::from_score(60), ScoreVerdict::Improving);
        assert_eq!(ScoreVerdict::from_score(40), ScoreVerdict::Mixed);
        assert_eq!(ScoreVerdict::from_score(20), ScoreVerdict::Regressing);
    }

    #[test]
    fn lenient_number_reads() {
        let doc = json!({"cost": {"total_usd": "12.5"}, "tasks": {"completion_rate": true}});
        let metrics = extract_metrics(&doc);
        assert_eq!(metrics.get("total_cost_usd"), Some(12.5));
        assert_eq!(metrics.get("completion_rate_pct"), Some(100.0));
        assert_eq!(period_label(&doc), "unknown");
    }

    #[test]
    fn markdown_table() {
        let baseline = report(1234.5, 40.0, 0.5, 0.2, 0.3);
        let current = report(1000.0, 45.0, 0.5, 0.1, 0.6);
        let card = build(Path::new("a.json"), &baseline, Path::new("b.json"), &current);
        let md = card.to_markdown();

        assert!(md.starts_with("# Pilot Impact Scorecard\n"));
        assert!(md.contains("- Score: 60/100 (3/5 metrics improved)"));
        assert!(md.contains("- Verdict: `improving`"));
        assert!(md.contains("| Total Cost | $1,234.50 | $1,000.00 | -$234.50 | -19.0% | lower_is_better | improved |"));
        assert!(md.contains("| Heartbeat Cost Share | 40.0% | 45.0% | +5.0pp | +12.5% | lower_is_better | not improved |"));
    }

    #[test]
    fn load_report_rejects_bad_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let list = dir.path().join("list.json");
        std::fs::write(&list, "[1, 2]").unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();

        assert!(load_report(&dir.path().join("missing.json")).is_err());
        assert!(load_report(&list).unwrap_err().to_string().contains("JSON object"));
        assert!(load_report(&broken).unwrap_err().to_string().contains("not valid JSON"));
    }
}
