//! Configuration commands.

use super::config_file;
use anyhow::{Context, Result};
use colored::Colorize;
use mailtriage_config::Config;
use mailtriage_core::{BatchMode, ExtractionPolicy};
use std::path::Path;

pub fn show(config_override: Option<&Path>) -> Result<()> {
    let path = config_file(config_override)?;

    let contents = if path.exists() {
        std::fs::read_to_string(&path).context("Failed to read config file")?
    } else {
        println!(
            "{} No config file at {}, showing defaults.",
            "Note:".yellow().bold(),
            path.display()
        );
        Config::default_config_string()
    };

    println!("{}", "Current Configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    println!("{}", contents);

    Ok(())
}

pub fn path(config_override: Option<&Path>) -> Result<()> {
    println!("{}", config_file(config_override)?.display());
    Ok(())
}

pub fn set(config_override: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let path = config_file(config_override)?;

    let mut config = Config::load_from(&path).context("Failed to load config")?;
    apply(&mut config, key, value)?;
    config.save_to(&path).context("Failed to save config")?;

    println!("{} Set {} = {}", "✓".green(), key.cyan(), value);

    Ok(())
}

/// Apply one `section.field = value` assignment.
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["source", "directory"] => config.source.directory = value.to_string(),
        ["classifier", "base_url"] => config.classifier.base_url = value.to_string(),
        ["classifier", "model"] => config.classifier.model = value.to_string(),
        ["classifier", "api_key_env"] => config.classifier.api_key_env = value.to_string(),
        ["classifier", "temperature"] => {
            config.classifier.temperature = value.parse().context("Invalid temperature value")?;
        }
        ["classifier", "timeout_seconds"] => {
            config.classifier.timeout_seconds = value.parse().context("Invalid timeout value")?;
        }
        ["classifier", "max_retries"] => {
            config.classifier.max_retries = value.parse().context("Invalid max_retries value")?;
        }
        ["classifier", "max_in_flight"] => {
            config.classifier.max_in_flight =
                value.parse().context("Invalid max_in_flight value")?;
        }
        ["classifier", "concurrent_tasks"] => {
            config.classifier.concurrent_tasks = value.parse().context("Invalid boolean value")?;
        }
        ["classifier", "max_content_chars"] => {
            config.classifier.max_content_chars =
                value.parse().context("Invalid max_content_chars value")?;
        }
        ["pipeline", "mode"] => {
            config.pipeline.mode = BatchMode::from_str(value)
                .with_context(|| format!("Unknown mode: {} (expected strict or isolated)", value))?;
        }
        ["pipeline", "max_concurrent_documents"] => {
            config.pipeline.max_concurrent_documents = value
                .parse()
                .context("Invalid max_concurrent_documents value")?;
        }
        ["pipeline", "document_timeout_seconds"] => {
            config.pipeline.document_timeout_seconds =
                value.parse().context("Invalid timeout value")?;
        }
        ["pipeline", "extraction_policy"] => {
            config.pipeline.extraction_policy = ExtractionPolicy::from_str(value).with_context(|| {
                format!(
                    "Unknown extraction policy: {} (expected reference, lenient or strict)",
                    value
                )
            })?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    }

    Ok(())
}
