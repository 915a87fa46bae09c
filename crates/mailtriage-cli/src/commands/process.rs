//! Process command - classify every message in the source directory.

use super::{load_config, source_dir};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mailtriage_core::{BatchMode, BatchReport, DocumentStatus};
use mailtriage_ingest::{enumerate_sources, Pipeline};
use mailtriage_llm::ChatClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;

/// Run the process command.
pub fn run(
    config_override: Option<&Path>,
    dir: Option<String>,
    mode: Option<String>,
    concurrency: Option<usize>,
    output: Option<PathBuf>,
    summary: bool,
) -> Result<()> {
    let mut config = load_config(config_override)?;

    if let Some(mode) = mode {
        config.pipeline.mode = BatchMode::from_str(&mode)
            .with_context(|| format!("Unknown mode: {} (expected strict or isolated)", mode))?;
    }
    if let Some(n) = concurrency {
        if n == 0 {
            anyhow::bail!("--concurrency must be at least 1");
        }
        config.pipeline.max_concurrent_documents = n;
    }

    let dir = source_dir(&config, dir.as_deref());
    let sources = enumerate_sources(&dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    if sources.is_empty() {
        eprintln!(
            "{} No .eml or .msg files found in {}",
            "Note:".yellow().bold(),
            dir.display()
        );
    }

    let client = ChatClient::from_config(&config.classifier)
        .context("Failed to create classification client")?;
    debug!("Using model {} at {}", config.classifier.model, client.base_url());

    let pipeline = Pipeline::from_config(&config, Arc::new(client));

    let rt = Runtime::new().context("Failed to create async runtime")?;

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let result = rt.block_on(pipeline.run_with_progress(&sources, |report| {
        pb.set_message(report.file.clone());
        pb.inc(1);
    }));
    pb.finish_and_clear();

    let report = result?;

    if let Some(path) = &output {
        std::fs::write(path, render_json(&report)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!(
            "{} Wrote {} record(s) to {}",
            "✓".green(),
            report.documents.len(),
            path.display()
        );
    }

    if summary {
        print_summary(&report);
    } else if output.is_none() {
        println!("{}", render_json(&report)?);
    }

    Ok(())
}

/// Strict batches serialize as the plain analysis array; isolated batches
/// keep the per-document status.
fn render_json(report: &BatchReport) -> Result<String> {
    let json = match report.mode {
        BatchMode::Strict => serde_json::to_string_pretty(&report.analyses())?,
        BatchMode::Isolated => serde_json::to_string_pretty(report)?,
    };
    Ok(json)
}

fn print_summary(report: &BatchReport) {
    println!("{}", "Classification Summary".cyan().bold());
    println!("{}", "─".repeat(50));

    for document in &report.documents {
        match &document.status {
            DocumentStatus::Ok { analysis } => {
                println!(
                    "{} {} {}",
                    "●".green(),
                    document.file.white().bold(),
                    format!("[{}]", document.format).dimmed()
                );
                println!("    Subject:    {}", analysis.subject);
                println!(
                    "    Request:    {} ({:.0}%)",
                    analysis.request_type.cyan(),
                    analysis.confidence_score * 100.0
                );
                if !analysis.sub_request_types.is_empty() {
                    println!("    Sub-types:  {}", analysis.sub_request_types.join(", "));
                }
                println!("    Sentiment:  {}", analysis.sentiment);
                println!("    Intent:     {}", analysis.intent);
                println!("    Spam:       {}", analysis.spam_status);
                for (key, value) in &analysis.entities {
                    println!("    {} {}", format!("{}:", key).dimmed(), value);
                }
            }
            DocumentStatus::Failed { stage, error } => {
                println!(
                    "{} {} {}",
                    "✗".red(),
                    document.file.white().bold(),
                    format!("[{} failed]", stage).red()
                );
                println!("    {}", error.dimmed());
            }
        }
    }

    let elapsed = report.finished_at - report.started_at;
    println!();
    println!(
        "{} {} succeeded, {} failed in {:.1}s",
        "Done:".green().bold(),
        report.succeeded(),
        report.failed(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
}
