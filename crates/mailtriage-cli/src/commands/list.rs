//! List command - show the message files that would be processed.

use super::{format_size, load_config, source_dir};
use anyhow::{Context, Result};
use colored::Colorize;
use mailtriage_ingest::enumerate_sources;
use std::path::Path;

pub fn run(config_override: Option<&Path>, dir: Option<String>) -> Result<()> {
    let config = load_config(config_override)?;
    let dir = source_dir(&config, dir.as_deref());

    let sources = enumerate_sources(&dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    println!("{} {}", "Source:".cyan().bold(), dir.display());
    println!("{}", "─".repeat(50));

    if sources.is_empty() {
        println!("{}", "No .eml or .msg files found.".yellow());
        return Ok(());
    }

    for source in &sources {
        let size = std::fs::metadata(&source.path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "?".to_string());
        println!(
            "  {} {} {}",
            format!("[{}]", source.format).dimmed(),
            source.file_name(),
            format!("({})", size).dimmed()
        );
    }

    println!();
    println!("{} message file(s)", sources.len());

    Ok(())
}
