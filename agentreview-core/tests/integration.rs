//! Integration tests for the ingestion and analysis pipeline
//!
//! These tests copy fixture files from `tests/fixtures/sessions/` into a temp
//! sessions directory and run the full ingest -> analyze flow.

use agentreview_core::analytics::{analyze, load_history, skills, AnalysisContext};
use agentreview_core::ingest::SkipReason;
use agentreview_core::{DateFilter, Error, IngestCoordinator, IngestOptions, Verdict};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/sessions")
        .join(name)
}

/// Create a sessions directory holding the named fixtures
fn sessions_dir(fixtures: &[&str]) -> TempDir {
    agentreview_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    for name in fixtures {
        fs::copy(fixture_path(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn week_of_feb_14() -> DateFilter {
    DateFilter::Range {
        since: date("2026-02-08"),
        until: date("2026-02-14"),
    }
}

fn options(filter: DateFilter) -> IngestOptions {
    IngestOptions {
        filter,
        ..Default::default()
    }
}

fn context(dir: &Path, filter: DateFilter) -> AnalysisContext {
    let mut ctx = AnalysisContext::new(dir, filter);
    ctx.generated_at = DateTime::parse_from_rfc3339("2026-02-15T06:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    ctx.hostname = "test-host".to_string();
    ctx.installed_skills = vec!["git".to_string(), "notes".to_string()];
    ctx
}

fn report_json(dir: &Path, filter: DateFilter, ctx: &AnalysisContext) -> Value {
    let ingest = IngestCoordinator::new(dir, options(filter)).ingest().unwrap();
    let report = analyze(ingest, ctx);
    serde_json::from_str(&report.to_json(true).unwrap()).unwrap()
}

// ============================================
// Ingestion
// ============================================

#[test]
fn test_ingest_counts_files_and_lines() {
    let dir = sessions_dir(&["chat-2026-02-14.jsonl", "heartbeat-main.jsonl", "broken.jsonl"]);
    let result = IngestCoordinator::new(dir.path(), options(week_of_feb_14()))
        .ingest()
        .expect("ingest should succeed");

    let diag = &result.diagnostics;
    assert_eq!(diag.files_total, 3);
    assert_eq!(diag.files_parsed, 2);
    assert_eq!(diag.files_unparseable, 1);
    assert_eq!(diag.files_unreadable, 0);
    // one bad line in the chat log, two in broken.jsonl
    assert_eq!(diag.malformed_lines, 3);
    assert_eq!(diag.selected_records, 7);
    assert_eq!(result.records.len(), 7);

    assert_eq!(result.skipped.len(), 1);
    assert!(result.skipped[0].0.ends_with("broken.jsonl"));
    assert_eq!(result.skipped[0].1, SkipReason::Unparseable);
}

#[test]
fn test_old_and_new_schema_lines_normalize_alike() {
    let dir = sessions_dir(&["chat-2026-02-14.jsonl", "heartbeat-main.jsonl"]);
    let result = IngestCoordinator::new(dir.path(), options(DateFilter::All))
        .ingest()
        .unwrap();

    let new_schema = result
        .records
        .iter()
        .find(|r| r.session_id == "chat-2026-02-14" && r.stop_reason.as_deref() == Some("toolUse"))
        .expect("assistant line from the nested schema");
    assert!(new_schema.is_assistant());
    assert_eq!(new_schema.model.as_deref(), Some("claude-sonnet-4"));
    assert_eq!(new_schema.cost_usd, 0.5);
    assert_eq!(new_schema.tool_calls[0].name, "git.commit");

    let old_schema = result
        .records
        .iter()
        .find(|r| r.session_id == "heartbeat-main" && r.is_assistant())
        .expect("assistant line from the flat schema");
    assert_eq!(old_schema.model.as_deref(), Some("claude-haiku"));
    assert_eq!(old_schema.cost_usd, 0.25);
    assert!(!old_schema.cost_estimated);
    assert_eq!(old_schema.tool_calls[0].name, "write");
    assert_eq!(old_schema.tool_calls[0].arguments["path"], "config/app.yaml");
}

#[test]
fn test_missing_directory_is_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = IngestCoordinator::new(&missing, IngestOptions::default())
        .ingest()
        .unwrap_err();
    assert!(matches!(err, Error::SessionsDirMissing(_)));
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_directory_without_logs_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "not a session log").unwrap();
    let err = IngestCoordinator::new(dir.path(), IngestOptions::default())
        .ingest()
        .unwrap_err();
    assert!(matches!(err, Error::NoSessionFiles(_)));
}

#[test]
fn test_record_ceiling() {
    let dir = sessions_dir(&["chat-2026-02-14.jsonl", "heartbeat-main.jsonl"]);

    let capped = IngestOptions {
        filter: DateFilter::All,
        max_records: 3,
    };
    let err = IngestCoordinator::new(dir.path(), capped).ingest().unwrap_err();
    assert!(matches!(err, Error::RecordLimitExceeded { count: 7, max: 3 }));
    assert!(err.to_string().contains("exceeds --max-records 3"));

    let disabled = IngestOptions {
        filter: DateFilter::All,
        max_records: 0,
    };
    let result = IngestCoordinator::new(dir.path(), disabled).ingest().unwrap();
    assert_eq!(result.records.len(), 7);
}

// ============================================
// End-to-end report
// ============================================

#[test]
fn test_week_report_matches_scenario() {
    let dir = sessions_dir(&["chat-2026-02-14.jsonl", "heartbeat-main.jsonl", "broken.jsonl"]);
    let ctx = context(dir.path(), week_of_feb_14());
    let doc = report_json(dir.path(), week_of_feb_14(), &ctx);

    assert_eq!(doc["meta"]["generated_at"], "2026-02-15T06:00:00Z");
    assert_eq!(doc["meta"]["period"], json!({"start": "2026-02-08", "end": "2026-02-14", "days": 7}));
    assert_eq!(doc["meta"]["ingestion"]["files_unparseable"], 1);

    assert_eq!(doc["tasks"]["asked"], 2);
    assert_eq!(doc["tasks"]["completed"], 1);
    assert_eq!(doc["tasks"]["failed"], 1);
    assert_eq!(doc["tasks"]["completion_rate"], 0.5);

    assert_eq!(doc["autonomous"]["sessions"], 1);
    assert_eq!(doc["autonomous"]["three_am_sessions"], 1);
    assert_eq!(doc["autonomous"]["risky_count"], 1);
    assert_eq!(doc["autonomous"]["notable"][0]["verdict"], "risky");
    assert_eq!(doc["autonomous"]["notable"][0]["paths"], json!(["config/app.yaml"]));

    assert_eq!(doc["skills"]["installed"], 2);
    assert_eq!(doc["skills"]["used"], 1);
    assert_eq!(doc["skills"]["top_used"][0]["name"], "git");
    assert_eq!(doc["skills"]["unused"], json!(["notes"]));

    assert_eq!(doc["health"]["errors_total"], 1);
    assert_eq!(doc["cost"]["declared_records"], 3);
    assert!(doc["cost"]["total_usd"].as_f64().unwrap() >= 1.0);
    assert_eq!(doc["cost"]["by_source"]["heartbeats"]["count"], 1);

    assert_eq!(doc["rating"]["title"], "Middle Management");
    assert_eq!(doc["rating"]["improved"], false);
}

#[test]
fn test_out_of_window_file_gives_zero_report() {
    let dir = sessions_dir(&["chat-2026-02-14.jsonl"]);
    let january = DateFilter::Range {
        since: date("2026-01-01"),
        until: date("2026-01-07"),
    };
    let ctx = context(dir.path(), january);
    let doc = report_json(dir.path(), january, &ctx);

    assert_eq!(doc["meta"]["ingestion"]["files_parsed"], 1);
    assert_eq!(doc["meta"]["ingestion"]["files_without_records"], 1);
    assert_eq!(doc["meta"]["ingestion"]["selected_records"], 0);
    assert_eq!(doc["tasks"]["asked"], 0);
    assert_eq!(doc["tasks"]["completion_rate"], 0.0);
    assert_eq!(doc["cost"]["total_usd"], 0.0);
    assert_eq!(doc["autonomous"]["sessions"], 0);
    assert_eq!(doc["health"]["errors_total"], 0);
    assert_eq!(doc["health"]["avg_response_seconds"], 0.0);
    assert_eq!(doc["rating"]["title"], "Unpaid Intern");
}

#[test]
fn test_report_is_deterministic() {
    let dir = sessions_dir(&["chat-2026-02-14.jsonl", "heartbeat-main.jsonl"]);
    let ctx = context(dir.path(), DateFilter::All);
    let first = report_json(dir.path(), DateFilter::All, &ctx);
    let second = report_json(dir.path(), DateFilter::All, &ctx);
    assert_eq!(first, second);
}

// ============================================
// Optional inputs: skills and history
// ============================================

#[test]
fn test_skills_document_drives_usage() {
    let dir = TempDir::new().unwrap();
    let json_doc = dir.path().join("skills.json");
    fs::write(&json_doc, r#"{"skills": {"entries": {"notes": {}, "git": {"enabled": true}}}}"#).unwrap();
    assert_eq!(skills::load_installed(&json_doc), ["git", "notes"]);

    let toml_doc = dir.path().join("skills.toml");
    fs::write(&toml_doc, "[[skills]]\nname = \"git\"\n\n[[skills]]\nname = \"deploy\"\n").unwrap();
    assert_eq!(skills::load_installed(&toml_doc), ["git", "deploy"]);

    assert!(skills::load_installed(&dir.path().join("missing.json")).is_empty());
}

#[test]
fn test_history_sets_baseline_and_trends() {
    let sessions = sessions_dir(&["chat-2026-02-14.jsonl", "heartbeat-main.jsonl"]);
    let history_dir = TempDir::new().unwrap();
    fs::write(
        history_dir.path().join("report-week-5.json"),
        json!({
            "cost": {"total_usd": 2.0},
            "health": {"error_rate": 0.1},
            "rating": {"title": "Quiet Quitter", "tier_index": 1, "task_completion_rate": 0.4}
        })
        .to_string(),
    )
    .unwrap();
    fs::write(history_dir.path().join("notes-week-x.json"), "{}").unwrap();

    let history = load_history(history_dir.path()).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].week, 5);

    let mut ctx = context(sessions.path(), week_of_feb_14());
    ctx.history = history;
    let doc = report_json(sessions.path(), week_of_feb_14(), &ctx);

    assert_eq!(doc["rating"]["previous_title"], "Quiet Quitter");
    assert_eq!(doc["rating"]["previous_task_completion_rate"], 0.4);
    assert_eq!(doc["rating"]["improved"], true);
    assert_eq!(doc["cost"]["trend"], json!([{"week": 5, "value": 2.0}]));
    assert_eq!(doc["tasks"]["trend"], json!([{"week": 5, "value": 40.0}]));
    assert_eq!(doc["health"]["error_rate_trend"], json!([{"week": 5, "value": 10.0}]));
}

#[test]
fn test_autonomous_entry_verdict_enum_is_exposed() {
    let dir = sessions_dir(&["heartbeat-main.jsonl"]);
    let ingest = IngestCoordinator::new(dir.path(), options(DateFilter::All))
        .ingest()
        .unwrap();
    let report = analyze(ingest, &context(dir.path(), DateFilter::All));
    assert_eq!(report.autonomous.notable.len(), 1);
    assert_eq!(report.autonomous.notable[0].verdict, Verdict::Risky);
    assert!(report.autonomous.notable[0].late_night);
}
