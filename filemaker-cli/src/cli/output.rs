//! Rendering of command results

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Single-line JSON
    JsonCompact,
}

/// Format results according to the specified output format
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to format JSON output")
        }
        OutputFormat::JsonCompact => {
            serde_json::to_string(data).context("Failed to format JSON output")
        }
    }
}

/// Status lines go to stderr so stdout stays machine readable
pub fn status(message: &str) {
    eprintln!("{} {}", "•".cyan(), message);
}

pub fn success(message: &str) {
    eprintln!("{} {}", "✓".bright_green().bold(), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", "✗".bright_red().bold(), message);
}
