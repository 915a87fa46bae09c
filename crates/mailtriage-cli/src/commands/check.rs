//! Check command - verify tools, credentials and the classification service.

use super::{load_config, source_dir};
use anyhow::{Context, Result};
use colored::Colorize;
use mailtriage_ingest::enumerate_sources;
use mailtriage_llm::ChatClient;
use std::path::Path;
use tokio::runtime::Runtime;

pub fn run(config_override: Option<&Path>) -> Result<()> {
    let config = load_config(config_override)?;

    println!("{}", "mailtriage Check".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "External Tools".white().bold());
    for (tool, available) in mailtriage_process::check_dependencies() {
        if available {
            println!("  {} {}", "●".green(), tool);
        } else {
            println!(
                "  {} {} {}",
                "✗".red(),
                tool,
                "(image attachments will fail to extract)".dimmed()
            );
        }
    }

    println!();
    println!("{}", "Source".white().bold());
    let dir = source_dir(&config, None);
    match enumerate_sources(&dir) {
        Ok(sources) => println!(
            "  {} {} ({} message file(s))",
            "●".green(),
            dir.display(),
            sources.len()
        ),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }

    println!();
    println!("{}", "Classification Service".white().bold());
    println!("  Endpoint: {}", config.classifier.base_url);
    println!("  Model:    {}", config.classifier.model);

    if let Err(e) = config.classifier.api_key() {
        println!("  {} {}", "✗".red(), e);
        return Ok(());
    }
    println!("  {} API key found in {}", "●".green(), config.classifier.api_key_env);

    let client = ChatClient::from_config(&config.classifier)
        .context("Failed to create classification client")?;
    let rt = Runtime::new().context("Failed to create async runtime")?;

    if rt.block_on(client.is_available()) {
        println!("  {} Endpoint reachable", "●".green());
    } else {
        println!(
            "  {} Endpoint not reachable at {}",
            "✗".red(),
            client.base_url()
        );
    }

    Ok(())
}
