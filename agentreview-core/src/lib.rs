//! # agentreview-core
//!
//! Core library for agentreview - a performance review for autonomous coding
//! agents, built from their session logs.
//!
//! This library provides:
//! - Ingestion of line-delimited JSON session logs (old and new schema)
//! - Session, task and autonomous-activity reconstruction
//! - Cost, skill, health and rating analytics
//! - Pilot scorecards comparing two reports
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Layer 0 (Raw):** Session log files on disk (never modified)
//! - **Layer 1 (Records):** Normalized [`Record`]s, filtered by date window
//! - **Layer 2 (Derived):** Sessions, tasks, audit entries and the [`Report`](analytics::Report)
//!
//! Nothing is persisted between runs; prior reports are read back only as
//! history snapshots.
//!
//! ## Example
//!
//! ```rust,no_run
//! use agentreview_core::analytics::{analyze, AnalysisContext};
//! use agentreview_core::ingest::{DateFilter, IngestCoordinator, IngestOptions};
//!
//! let coordinator = IngestCoordinator::new("/var/log/agent/sessions", IngestOptions::default());
//! let ingest = coordinator.ingest().expect("failed to ingest sessions");
//! let context = AnalysisContext::new(coordinator.sessions_dir(), DateFilter::All);
//! let report = analyze(ingest, &context);
//! println!("{}", report.to_json(true).expect("report serializes"));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{DateFilter, IngestCoordinator, IngestOptions, IngestResult};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod scorecard;
pub mod types;
