//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::feed::STDIN_PATH;
use crate::grouping::DayZone;
use crate::models::NotificationKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Notifold - group Mastodon notifications into display-ready entries
///
/// Reads one or more pages of notifications (the JSON body of
/// GET /api/v1/notifications), folds favourites, boosts, follows and
/// mentions about the same post on the same day into single entries,
/// and writes a Markdown or JSON report.
///
/// Examples:
///   notifold page1.json page2.json
///   curl -s -H "Authorization: Bearer $TOKEN" https://example.social/api/v1/notifications | notifold
///   notifold page.json --format json --timezone +02:00 -o grouped.json
///   notifold --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Feed pages to read, in order ("-" for stdin)
    ///
    /// Pages are concatenated before grouping. Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output file path for the report (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Timezone used to decide calendar days
    ///
    /// Values: local, utc, or an offset such as +02:00.
    /// Can also be set via NOTIFOLD_TIMEZONE or .notifold.toml.
    #[arg(long, value_name = "ZONE", env = "NOTIFOLD_TIMEZONE")]
    pub timezone: Option<String>,

    /// Abort on the first malformed notification instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Notification types to leave out (comma-separated)
    ///
    /// Example: --exclude-types mention,poll
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub exclude_types: Option<Vec<String>>,

    /// Number of rows in the most active accounts table
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .notifold.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 if any record had to be skipped
    #[arg(long)]
    pub fail_on_skipped: bool,

    /// Generate a default .notifold.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if let Some(ref zone) = self.timezone {
            zone.parse::<DayZone>().map_err(|e| e.to_string())?;
        }

        if let Some(ref types) = self.exclude_types {
            if types.iter().any(|t| t.trim().is_empty()) {
                return Err("--exclude-types contains an empty type".to_string());
            }
        }

        let stdin_count = self
            .inputs
            .iter()
            .filter(|p| p.as_os_str() == STDIN_PATH)
            .count();
        if stdin_count > 1 {
            return Err("stdin ('-') can only be read once".to_string());
        }

        for input in &self.inputs {
            if input.as_os_str() != STDIN_PATH && !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Returns the feed pages to read, defaulting to stdin.
    pub fn effective_inputs(&self) -> Vec<PathBuf> {
        if self.inputs.is_empty() {
            vec![PathBuf::from(STDIN_PATH)]
        } else {
            self.inputs.clone()
        }
    }
}

/// Parse type names into notification kinds.
pub fn parse_kinds(types: &[String]) -> Vec<NotificationKind> {
    types
        .iter()
        .map(|t| NotificationKind::from(t.trim()))
        .collect()
}
