//! Initialize mailtriage.

use super::config_file;
use anyhow::{Context, Result};
use colored::Colorize;
use mailtriage_config::Config;
use std::path::Path;

pub fn run(config_override: Option<&Path>) -> Result<()> {
    let path = config_file(config_override)?;

    if path.exists() {
        println!("{} mailtriage is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", path.display());
        return Ok(());
    }

    println!("{}", "Initializing mailtriage...".cyan().bold());

    Config::create_default_file(&path).context("Failed to create config file")?;
    println!("  {} Created config: {}", "✓".green(), path.display());

    println!();
    println!("{}", "mailtriage initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  1. Export your API key: {}",
        "export OPENAI_API_KEY=...".cyan()
    );
    println!(
        "  2. Point it at your messages: {}",
        "mailtriage config set source.directory ~/Mail/inbox".cyan()
    );
    println!("  3. Check the setup: {}", "mailtriage check".cyan());

    Ok(())
}
