//! The report document.
//!
//! Top-level sections are `meta`, `cost`, `tasks`, `autonomous`, `skills`,
//! `health` and `rating`. Downstream renderers depend on these names, so
//! fields may be added but never renamed or removed.

use crate::analytics::autonomous::AutonomousSummary;
use crate::analytics::cost::CostTotals;
use crate::analytics::health::HealthTotals;
use crate::analytics::history::TrendPoint;
use crate::analytics::rating::Rating;
use crate::analytics::skills::SkillsSummary;
use crate::analytics::tasks::TaskCounts;
use crate::ingest::IngestDiagnostics;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub meta: Meta,
    pub cost: CostSection,
    pub tasks: TasksSection,
    pub autonomous: AutonomousSummary,
    pub skills: SkillsSummary,
    pub health: HealthSection,
    pub rating: Rating,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Meta {
    pub generated_at: String,
    pub period: Period,
    pub agent_id: String,
    pub hostname: String,
    pub sessions_dir: String,
    pub ingestion: IngestDiagnostics,
}

/// Analyzed calendar window. Bounds are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Period {
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CostSection {
    #[serde(flatten)]
    pub totals: CostTotals,
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TasksSection {
    #[serde(flatten)]
    pub counts: TaskCounts,
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthSection {
    #[serde(flatten)]
    pub totals: HealthTotals,
    pub error_rate_trend: Vec<TrendPoint>,
}

impl Report {
    /// Render as JSON text.
    pub fn to_json(&self, pretty: bool) -> crate::error::Result<String> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(text)
    }
}
