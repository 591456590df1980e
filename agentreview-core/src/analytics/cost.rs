//! Cost attribution.
//!
//! Every record resolves to a non-negative cost. Declared costs are used
//! verbatim; otherwise the estimator below derives one from the length of the
//! record's text and the model identifier, with no other inputs.

use crate::analytics::sessions::Session;
use crate::format::{ratio, round_pct, round_usd};
use crate::types::{Record, SessionSource};
use serde::Serialize;
use std::collections::BTreeMap;

/// Characters added to every message for framing, system prompt share, etc.
pub const MESSAGE_OVERHEAD_CHARS: usize = 400;

/// Averaging divisor applied after scaling (characters per token).
pub const CHARS_PER_TOKEN: f64 = 4.0;

/// USD per thousand tokens, by model tier.
const PREMIUM_RATE: f64 = 0.075;
const MID_RATE: f64 = 0.015;
const ECONOMY_RATE: f64 = 0.004;
const DEFAULT_RATE: f64 = 0.01;

/// Number of models listed under `cost.by_model`.
const TOP_MODELS: usize = 5;

/// Pricing tier picked from the model identifier.
pub fn rate_per_thousand(model: Option<&str>) -> f64 {
    let Some(model) = model else {
        return DEFAULT_RATE;
    };
    let m = model.to_lowercase();
    if m.contains("opus") {
        PREMIUM_RATE
    } else if m.contains("sonnet") {
        MID_RATE
    } else if m.contains("haiku") {
        ECONOMY_RATE
    } else {
        DEFAULT_RATE
    }
}

/// Estimate the cost of a message from its text length and model.
pub fn estimate_cost(text_len: usize, model: Option<&str>) -> f64 {
    let chars = (text_len + MESSAGE_OVERHEAD_CHARS) as f64;
    (chars / 1000.0) * rate_per_thousand(model) / CHARS_PER_TOKEN
}

/// Resolve a record's cost, returning `(usd, estimated)`.
pub fn resolve_cost(declared: Option<f64>, text_len: usize, model: Option<&str>) -> (f64, bool) {
    match declared {
        Some(usd) if usd.is_finite() && usd >= 0.0 => (usd, false),
        _ => (estimate_cost(text_len, model), true),
    }
}

/// Cost attributed to one session source.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SourceCost {
    pub usd: f64,
    pub pct: f64,
    /// Number of sessions with this source
    pub count: usize,
}

/// Cost attributed to one model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelCost {
    pub model: String,
    pub usd: f64,
    pub records: usize,
}

/// Totals for the `cost` report section (trend is filled in by the engine).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CostTotals {
    pub total_usd: f64,
    pub per_completed_task_usd: f64,
    pub estimated_records: usize,
    pub declared_records: usize,
    pub by_source: BTreeMap<SessionSource, SourceCost>,
    pub by_model: Vec<ModelCost>,
}

/// Aggregate record costs by session source and model.
pub fn summarize(sessions: &[Session<'_>], completed_tasks: usize) -> CostTotals {
    let mut totals = CostTotals::default();
    let mut source_usd: BTreeMap<SessionSource, f64> = BTreeMap::new();
    let mut source_sessions: BTreeMap<SessionSource, usize> = BTreeMap::new();
    let mut models: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for session in sessions {
        *source_sessions.entry(session.source).or_insert(0) += 1;
        for record in &session.records {
            totals.total_usd += record.cost_usd;
            *source_usd.entry(session.source).or_insert(0.0) += record.cost_usd;
            if record.cost_estimated {
                totals.estimated_records += 1;
            } else {
                totals.declared_records += 1;
            }
            if record.is_assistant() || record.declared_cost.is_some() {
                let model = model_label(record);
                let entry = models.entry(model).or_insert((0.0, 0));
                entry.0 += record.cost_usd;
                entry.1 += 1;
            }
        }
    }

    for source in SessionSource::ALL {
        let usd = source_usd.get(&source).copied().unwrap_or(0.0);
        totals.by_source.insert(
            source,
            SourceCost {
                usd: round_usd(usd),
                pct: round_pct(ratio(usd, totals.total_usd) * 100.0),
                count: source_sessions.get(&source).copied().unwrap_or(0),
            },
        );
    }

    let mut by_model: Vec<ModelCost> = models
        .into_iter()
        .map(|(model, (usd, records))| ModelCost {
            model,
            usd,
            records,
        })
        .collect();
    by_model.sort_by(|a, b| b.usd.total_cmp(&a.usd).then_with(|| a.model.cmp(&b.model)));
    by_model.truncate(TOP_MODELS);
    for entry in &mut by_model {
        entry.usd = round_usd(entry.usd);
    }
    totals.by_model = by_model;

    totals.per_completed_task_usd = round_usd(ratio(totals.total_usd, completed_tasks as f64));
    totals.total_usd = round_usd(totals.total_usd);
    totals
}

fn model_label(record: &Record) -> String {
    record
        .model
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}
