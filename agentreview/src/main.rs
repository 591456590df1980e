//! agentreview - performance review for an autonomous coding agent
//!
//! Reads the agent's session logs, analyzes a date window, and writes the
//! report as JSON.

use agentreview_core::analytics::{analyze, load_history, skills, AnalysisContext};
use agentreview_core::{Config, DateFilter, Error, IngestCoordinator, IngestOptions};
use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agentreview")]
#[command(about = "Analyze agent session logs and emit a performance review report")]
#[command(version)]
struct Args {
    /// Directory of session logs (*.jsonl). Defaults to analysis.sessions_dir
    sessions_dir: Option<PathBuf>,

    /// First day of the window, inclusive (YYYY-MM-DD)
    #[arg(long, conflicts_with = "all")]
    since: Option<String>,

    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long, conflicts_with = "all")]
    until: Option<String>,

    /// Analyze every record regardless of date
    #[arg(long)]
    all: bool,

    /// Installed-skills document (JSON or TOML)
    #[arg(long = "config", value_name = "SKILLS_CONFIG")]
    skills_config: Option<PathBuf>,

    /// Record ceiling; 0 disables the check
    #[arg(long)]
    max_records: Option<usize>,

    /// Directory of prior weekly snapshots
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Agent identity reported in meta.agent_id
    #[arg(long)]
    agent_id: Option<String>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the report timestamp (RFC 3339)
    #[arg(long)]
    generated_at: Option<String>,

    /// Emit single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard = match agentreview_core::logging::init(&config.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!(
                "Warning: logging to {} disabled: {}",
                Config::log_path().display(),
                e
            );
            None
        }
    };

    let sessions_dir = args
        .sessions_dir
        .clone()
        .or_else(|| config.analysis.sessions_dir.clone())
        .context("no sessions directory given and analysis.sessions_dir is not configured")?;

    let today = Utc::now().date_naive();
    let filter = resolve_window(&args, config.analysis.window_days, today)?;

    let options = IngestOptions {
        filter,
        max_records: args.max_records.unwrap_or(config.analysis.max_records),
    };
    let coordinator = IngestCoordinator::new(sessions_dir, options);
    let ingest = coordinator.ingest()?;

    let installed_skills = args
        .skills_config
        .as_ref()
        .or(config.analysis.skills_config.as_ref())
        .map(|path| skills::load_installed(path))
        .unwrap_or_default();

    let history_dir = args
        .history_dir
        .clone()
        .unwrap_or_else(|| config.analysis.resolved_history_dir());
    let history = load_history(&history_dir)
        .with_context(|| format!("failed to load history from {}", history_dir.display()))?;

    let mut context = AnalysisContext::new(coordinator.sessions_dir(), filter);
    context.agent_id = args
        .agent_id
        .clone()
        .unwrap_or_else(|| config.analysis.agent_id.clone());
    context.installed_skills = installed_skills;
    context.history = history;
    if let Some(ref raw) = args.generated_at {
        context.generated_at = DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --generated-at '{}' (expected RFC 3339)", raw))?
            .with_timezone(&Utc);
    }

    let report = analyze(ingest, &context);
    let json = report.to_json(!args.compact)?;

    match args.output {
        Some(ref path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Turn the date flags into a filter.
///
/// With no bounds the window is the trailing `window_days` ending `today`.
fn resolve_window(args: &Args, window_days: u32, today: NaiveDate) -> Result<DateFilter> {
    if args.all {
        return Ok(DateFilter::All);
    }

    let since = args.since.as_deref().map(parse_date).transpose()?;
    let until = args.until.as_deref().map(parse_date).transpose()?;
    let span = Days::new(u64::from(window_days.max(1) - 1));

    let (since, until) = match (since, until) {
        (Some(since), Some(until)) => (since, until),
        (Some(since), None) => (since, today),
        (None, Some(until)) => (until.checked_sub_days(span).unwrap_or(until), until),
        (None, None) => (today.checked_sub_days(span).unwrap_or(today), today),
    };

    if since > until {
        anyhow::bail!("--since {} is after --until {}", since, until);
    }

    Ok(DateFilter::Range { since, until })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::InvalidDate(raw.to_string()).into())
}
