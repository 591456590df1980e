//! Ingestion layer for agent session logs
//!
//! Reads every `*.jsonl` file in a sessions directory, decodes each line into
//! a [`Record`](crate::types::Record), and applies the date window and the
//! record-count ceiling.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │  Session logs   │ ──► │ IngestCoordinator│ ──► │  IngestResult   │
//! │ (<dir>/*.jsonl) │     │                  │     │ records + diag  │
//! └─────────────────┘     └──────────────────┘     └─────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────────┐
//!                    │  normalize_line      │
//!                    │  (old + new schema)  │
//!                    └──────────────────────┘
//! ```
//!
//! ## Failure policy
//!
//! Only a missing directory, a directory without logs, and the record-count
//! ceiling abort ingestion. Unreadable or unparseable files are skipped and
//! counted in [`IngestDiagnostics`]. An empty selection is not an error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentreview_core::ingest::{DateFilter, IngestCoordinator, IngestOptions};
//!
//! let options = IngestOptions { filter: DateFilter::All, max_records: 250_000 };
//! let result = IngestCoordinator::new("/var/log/agent/sessions", options).ingest()?;
//! println!("{} records from {} files", result.records.len(), result.diagnostics.files_parsed);
//! ```

pub mod normalize;

pub use normalize::normalize_line;

use crate::error::{Error, Result};
use crate::types::{date_prefix, Record};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ============================================
// Options
// ============================================

/// Which records survive ingestion, by calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Keep everything, including records without a timestamp
    All,
    /// Keep records whose timestamp date falls in `[since, until]`
    Range { since: NaiveDate, until: NaiveDate },
}

impl DateFilter {
    /// Whether a record with this logged timestamp is selected.
    ///
    /// Compares the first ten characters of the timestamp against the bounds
    /// as strings, so any ISO-8601 prefix works without full parsing.
    pub fn admits(&self, timestamp: Option<&str>) -> bool {
        match self {
            DateFilter::All => true,
            DateFilter::Range { since, until } => {
                let Some(date) = timestamp.and_then(date_prefix) else {
                    return false;
                };
                let since = since.format("%Y-%m-%d").to_string();
                let until = until.format("%Y-%m-%d").to_string();
                since.as_str() <= date && date <= until.as_str()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub filter: DateFilter,
    /// Ceiling on selected records; 0 disables the check
    pub max_records: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            filter: DateFilter::All,
            max_records: crate::config::DEFAULT_MAX_RECORDS,
        }
    }
}

// ============================================
// Results
// ============================================

/// Counters surfaced as `meta.ingestion`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct IngestDiagnostics {
    pub files_total: usize,
    pub files_parsed: usize,
    pub files_unreadable: usize,
    pub files_unparseable: usize,
    pub files_without_records: usize,
    pub malformed_lines: usize,
    pub selected_records: usize,
    pub max_records: usize,
}

/// Reason a file contributed no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be read as UTF-8 text
    Unreadable(String),
    /// The file has content but no line decodes as a JSON object
    Unparseable,
    /// The file parsed, but nothing survived the date window
    NoRecordsInRange,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "unreadable: {}", e),
            SkipReason::Unparseable => write!(f, "no parseable JSON lines"),
            SkipReason::NoRecordsInRange => write!(f, "no records in selected window"),
        }
    }
}

/// Outcome of a full ingestion pass.
#[derive(Debug, Default)]
pub struct IngestResult {
    /// Selected records, in file order (not yet time-sorted)
    pub records: Vec<Record>,
    pub diagnostics: IngestDiagnostics,
    /// Files that contributed nothing, and why
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

impl IngestResult {
    /// Files existed but nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Outcome of reading one file.
#[derive(Debug)]
struct FileIngest {
    records: Vec<Record>,
    malformed_lines: usize,
    skip_reason: Option<SkipReason>,
}

// ============================================
// Coordinator
// ============================================

/// Reads a sessions directory into a filtered record stream.
pub struct IngestCoordinator {
    sessions_dir: PathBuf,
    options: IngestOptions,
}

impl IngestCoordinator {
    pub fn new(sessions_dir: impl Into<PathBuf>, options: IngestOptions) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
            options,
        }
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// All `*.jsonl` files in the sessions directory, sorted by path.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        if !self.sessions_dir.is_dir() {
            return Err(Error::SessionsDirMissing(self.sessions_dir.clone()));
        }

        let pattern = format!(
            "{}/*.jsonl",
            glob::Pattern::escape(&self.sessions_dir.to_string_lossy())
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::Config(format!("invalid sessions pattern: {}", e)))?;

        let mut files: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
        files.sort();

        if files.is_empty() {
            return Err(Error::NoSessionFiles(self.sessions_dir.clone()));
        }
        Ok(files)
    }

    /// Read, decode and filter every session file.
    ///
    /// The record-count ceiling is checked here, before any aggregation.
    pub fn ingest(&self) -> Result<IngestResult> {
        let files = self.discover_files()?;
        let mut result = IngestResult {
            diagnostics: IngestDiagnostics {
                files_total: files.len(),
                max_records: self.options.max_records,
                ..Default::default()
            },
            ..Default::default()
        };

        for path in &files {
            let file = self.ingest_file(path);
            result.diagnostics.malformed_lines += file.malformed_lines;

            match &file.skip_reason {
                Some(SkipReason::Unreadable(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session file");
                    result.diagnostics.files_unreadable += 1;
                }
                Some(SkipReason::Unparseable) => {
                    tracing::warn!(path = %path.display(), "skipping session file with no parseable lines");
                    result.diagnostics.files_unparseable += 1;
                }
                Some(SkipReason::NoRecordsInRange) => {
                    tracing::warn!(path = %path.display(), "session file has no records in the selected window");
                    result.diagnostics.files_parsed += 1;
                    result.diagnostics.files_without_records += 1;
                }
                None => {
                    result.diagnostics.files_parsed += 1;
                }
            }

            if let Some(reason) = file.skip_reason {
                result.skipped.push((path.clone(), reason));
            }
            result.records.extend(file.records);
        }

        let selected = result.records.len();
        result.diagnostics.selected_records = selected;

        if self.options.max_records > 0 && selected > self.options.max_records {
            return Err(Error::RecordLimitExceeded {
                count: selected,
                max: self.options.max_records,
            });
        }

        if result.is_empty() {
            tracing::warn!(
                dir = %self.sessions_dir.display(),
                files = files.len(),
                "no records selected; report will be zero-valued"
            );
        } else {
            tracing::info!(
                records = selected,
                files = result.diagnostics.files_parsed,
                malformed_lines = result.diagnostics.malformed_lines,
                "ingestion complete"
            );
        }

        Ok(result)
    }

    fn ingest_file(&self, path: &Path) -> FileIngest {
        let text = match std::fs::read(path).map(String::from_utf8) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return FileIngest::skipped(SkipReason::Unreadable(e.to_string())),
            Err(e) => return FileIngest::skipped(SkipReason::Unreadable(e.to_string())),
        };

        let session_id = session_id_for(path);
        let mut decoded = 0usize;
        let mut malformed_lines = 0usize;
        let mut records = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match normalize_line(&session_id, path, line) {
                Ok(record) => {
                    decoded += 1;
                    if self.options.filter.admits(record.timestamp.as_deref()) {
                        records.push(record);
                    }
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), line = line_no + 1, error = %e, "malformed line");
                    malformed_lines += 1;
                }
            }
        }

        let skip_reason = if decoded == 0 && malformed_lines > 0 {
            Some(SkipReason::Unparseable)
        } else if records.is_empty() {
            Some(SkipReason::NoRecordsInRange)
        } else {
            None
        };

        FileIngest {
            records,
            malformed_lines,
            skip_reason,
        }
    }
}

impl FileIngest {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            records: Vec::new(),
            malformed_lines: 0,
            skip_reason: Some(reason),
        }
    }
}

/// Session identifier for a log file: its file stem.
pub fn session_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn line(ts: &str, role: &str) -> String {
        format!(
            r#"{{"type":"message","timestamp":"{ts}","message":{{"role":"{role}","content":[{{"type":"text","text":"hi"}}]}}}}"#
        )
    }

    #[test]
    fn date_filter_is_inclusive_and_drops_untimed() {
        let filter = DateFilter::Range {
            since: date("2026-02-10"),
            until: date("2026-02-16"),
        };
        assert!(filter.admits(Some("2026-02-10T00:00:00Z")));
        assert!(filter.admits(Some("2026-02-16T23:59:59Z")));
        assert!(!filter.admits(Some("2026-02-17T00:00:00Z")));
        assert!(!filter.admits(Some("2026-02-09T23:59:59Z")));
        assert!(!filter.admits(Some("2026")));
        assert!(!filter.admits(None));

        assert!(DateFilter::All.admits(None));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let coordinator = IngestCoordinator::new(dir.path().join("absent"), IngestOptions::default());
        assert!(matches!(
            coordinator.ingest(),
            Err(Error::SessionsDirMissing(_))
        ));
    }

    #[test]
    fn directory_without_logs_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let coordinator = IngestCoordinator::new(dir.path(), IngestOptions::default());
        assert!(matches!(coordinator.ingest(), Err(Error::NoSessionFiles(_))));
    }

    #[test]
    fn per_file_problems_are_counted() {
        let dir = TempDir::new().unwrap();
        let good = format!(
            "{}\n{{ not json\n\n{}\n",
            line("2026-02-14T10:00:00Z", "user"),
            line("2026-02-14T10:01:00Z", "assistant")
        );
        std::fs::write(dir.path().join("good.jsonl"), good).unwrap();
        std::fs::write(dir.path().join("garbage.jsonl"), "nope\nstill nope\n").unwrap();
        std::fs::write(dir.path().join("binary.jsonl"), [0xff, 0xfe, 0x00]).unwrap();
        std::fs::write(dir.path().join("old.jsonl"), line("2025-01-01T00:00:00Z", "user")).unwrap();

        let options = IngestOptions {
            filter: DateFilter::Range {
                since: date("2026-02-08"),
                until: date("2026-02-14"),
            },
            max_records: 0,
        };
        let result = IngestCoordinator::new(dir.path(), options).ingest().unwrap();

        let diag = &result.diagnostics;
        assert_eq!(diag.files_total, 4);
        assert_eq!(diag.files_parsed, 2);
        assert_eq!(diag.files_unreadable, 1);
        assert_eq!(diag.files_unparseable, 1);
        assert_eq!(diag.files_without_records, 1);
        assert_eq!(diag.malformed_lines, 3);
        assert_eq!(diag.selected_records, 2);
        assert_eq!(result.records[0].session_id, "good");
        assert_eq!(result.skipped.len(), 3);
    }

    #[test]
    fn record_ceiling_is_inclusive() {
        let dir = TempDir::new().unwrap();
        let body: String = (0..3)
            .map(|i| line(&format!("2026-02-14T10:0{i}:00Z"), "assistant") + "\n")
            .collect();
        std::fs::write(dir.path().join("s.jsonl"), body).unwrap();

        let run = |max_records| {
            IngestCoordinator::new(
                dir.path(),
                IngestOptions {
                    filter: DateFilter::All,
                    max_records,
                },
            )
            .ingest()
        };

        assert_eq!(run(3).unwrap().records.len(), 3);
        assert!(matches!(
            run(2),
            Err(Error::RecordLimitExceeded { count: 3, max: 2 })
        ));
        assert_eq!(run(0).unwrap().records.len(), 3);
    }

    #[test]
    fn empty_selection_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("s.jsonl"), line("2020-01-01T00:00:00Z", "user")).unwrap();
        let options = IngestOptions {
            filter: DateFilter::Range {
                since: date("2026-02-08"),
                until: date("2026-02-14"),
            },
            max_records: 10,
        };
        let result = IngestCoordinator::new(dir.path(), options).ingest().unwrap();
        assert!(result.is_empty());
        assert_eq!(result.diagnostics.files_parsed, 1);
        assert_eq!(result.diagnostics.files_without_records, 1);
        assert_eq!(result.skipped[0].1, SkipReason::NoRecordsInRange);
    }
}
