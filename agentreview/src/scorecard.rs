//! agentreview-scorecard - compare a baseline report against a current one
//!
//! Scores five headline metrics and prints the result as a Markdown table or
//! JSON.

use agentreview_core::scorecard;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Parser)]
#[command(name = "agentreview-scorecard")]
#[command(about = "Before/after scorecard for two agentreview reports")]
#[command(version)]
struct Args {
    /// Report for the baseline window
    baseline: PathBuf,

    /// Report for the current window
    current: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    /// Write the scorecard here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let card = scorecard::build_from_files(&args.baseline, &args.current)?;
    let rendered = match args.format {
        OutputFormat::Markdown => card.to_markdown(),
        OutputFormat::Json => card.to_json()?,
    };

    match args.output {
        Some(ref path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, ensure_trailing_newline(rendered))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => print!("{}", ensure_trailing_newline(rendered)),
    }

    Ok(())
}

fn ensure_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
