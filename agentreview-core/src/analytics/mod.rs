//! Analytics for agentreview
//!
//! Derives the report sections from the selected record stream:
//! - Session reconstruction and source classification
//! - Task segmentation and highlights
//! - Cost attribution (declared or estimated)
//! - Autonomous action audit
//! - Installed-skill usage
//! - Health metrics
//! - Rating and week-over-week trends
//!
//! Stages are plain functions over [`sessions::Session`] slices. See [`engine`]
//! for the order they run in and [`report`] for the output document.

pub mod autonomous;
pub mod cost;
pub mod engine;
pub mod health;
pub mod heuristics;
pub mod history;
pub mod rating;
pub mod report;
pub mod sessions;
pub mod skills;
pub mod tasks;

pub use engine::{analyze, local_hostname, AnalysisContext};
pub use history::{load_history, Snapshot, TrendPoint};
pub use rating::{Rating, Tier, TIERS};
pub use report::Report;
pub use sessions::Session;
