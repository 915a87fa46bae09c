//! mailtriage CLI - classify a directory of email messages.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// mailtriage - email ingestion and classification
#[derive(Parser)]
#[command(name = "mailtriage")]
#[command(author = "Lalo Morales <lalomorales22@github.com>")]
#[command(version)]
#[command(about = "Classify .eml and .msg messages with an OpenAI-compatible model", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true, env = "MAILTRIAGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// List the message files in the source directory
    List {
        /// Source directory (default: from config)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Classify every message in the source directory
    Process {
        /// Source directory (default: from config)
        #[arg(short, long)]
        dir: Option<String>,

        /// Batch mode: strict or isolated
        #[arg(short, long)]
        mode: Option<String>,

        /// Number of messages processed at once
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Write the JSON output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a readable summary instead of JSON
        #[arg(short, long)]
        summary: bool,
    },

    /// Check external tools and the classification service
    Check,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., classifier.model)
        key: String,

        /// Value to set
        value: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailtriage=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailtriage=info,warn"))
    };

    // stdout carries the JSON output
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::run(config),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(config),
            ConfigCommands::Path => commands::config::path(config),
            ConfigCommands::Set { key, value } => commands::config::set(config, &key, &value),
        },
        Commands::List { dir } => commands::list::run(config, dir),
        Commands::Process {
            dir,
            mode,
            concurrency,
            output,
            summary,
        } => commands::process::run(config, dir, mode, concurrency, output, summary),
        Commands::Check => commands::check::run(config),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
