//! Completion-rate rating.
//!
//! The rating is a fixed ladder of six tiers keyed on task completion rate.
//! Week-over-week comparison uses the most recent history snapshot as the
//! baseline; with no history the baseline is the current tier itself.

use crate::analytics::history::Snapshot;
use crate::format::round_rate;
use serde::Serialize;

/// One rung of the rating ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub index: usize,
    pub title: &'static str,
    pub color: &'static str,
    /// Exclusive upper bound on completion rate; `None` for the top tier
    upper: Option<f64>,
    /// Display percentile ("Top N%")
    pub percentile: u32,
}

/// Tiers in ascending order.
pub const TIERS: [Tier; 6] = [
    Tier {
        index: 0,
        title: "Unpaid Intern",
        color: "#dc2626",
        upper: Some(0.30),
        percentile: 90,
    },
    Tier {
        index: 1,
        title: "Quiet Quitter",
        color: "#f97316",
        upper: Some(0.50),
        percentile: 70,
    },
    Tier {
        index: 2,
        title: "Middle Management",
        color: "#eab308",
        upper: Some(0.65),
        percentile: 50,
    },
    Tier {
        index: 3,
        title: "Ships Code",
        color: "#22c55e",
        upper: Some(0.80),
        percentile: 30,
    },
    Tier {
        index: 4,
        title: "Founder Mode",
        color: "#3b82f6",
        upper: Some(0.90),
        percentile: 15,
    },
    Tier {
        index: 5,
        title: "AGI",
        color: "#a855f7",
        upper: None,
        percentile: 5,
    },
];

/// Tier for a 0..1 completion rate.
pub fn tier_for_rate(rate: f64) -> &'static Tier {
    let rate = if rate.is_finite() { rate } else { 0.0 };
    TIERS
        .iter()
        .find(|tier| tier.upper.map_or(true, |upper| rate < upper))
        .unwrap_or(&TIERS[TIERS.len() - 1])
}

/// Tier by ordinal, clamped to the ladder.
pub fn tier_by_index(index: usize) -> &'static Tier {
    &TIERS[index.min(TIERS.len() - 1)]
}

/// The `rating` report section.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rating {
    pub title: String,
    pub color: String,
    pub tier_index: usize,
    pub task_completion_rate: f64,
    pub percentile: u32,
    pub previous_title: String,
    pub previous_task_completion_rate: Option<f64>,
    pub improved: bool,
}

/// Rate the run and compare it against the latest snapshot in `history`.
///
/// `history` must be sorted oldest first.
pub fn rate(completion_rate: f64, history: &[Snapshot]) -> Rating {
    let tier = tier_for_rate(completion_rate);
    let baseline = history.last();

    let (previous, previous_rate) = match baseline {
        Some(snapshot) => (tier_by_index(snapshot.tier_index), Some(snapshot.completion_rate)),
        None => (tier, None),
    };
    let previous_title = baseline
        .and_then(|s| s.title.clone())
        .unwrap_or_else(|| previous.title.to_string());

    Rating {
        title: tier.title.to_string(),
        color: tier.color.to_string(),
        tier_index: tier.index,
        task_completion_rate: round_rate(completion_rate),
        percentile: tier.percentile,
        previous_title,
        previous_task_completion_rate: previous_rate.map(round_rate),
        improved: tier.index > previous.index,
    }
}
