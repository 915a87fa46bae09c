//! CLI command implementations.

pub mod check;
pub mod config;
pub mod init;
pub mod list;
pub mod process;

use anyhow::{Context, Result};
use mailtriage_config::{AppPaths, Config};
use std::path::{Path, PathBuf};

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// The config file in use: the `--config` override or the platform default.
pub fn config_file(config_override: Option<&Path>) -> Result<PathBuf> {
    match config_override {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(get_paths()?.config_file),
    }
}

/// Load the configuration, falling back to defaults when no file exists.
pub fn load_config(config_override: Option<&Path>) -> Result<Config> {
    let path = config_file(config_override)?;
    Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// The source directory, from `dir` if given, else from config, with `~` expanded.
pub fn source_dir(config: &Config, dir: Option<&str>) -> PathBuf {
    let dir = dir.unwrap_or(&config.source.directory);
    PathBuf::from(shellexpand::tilde(dir).as_ref())
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
