//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.notifold.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::grouping::MalformedPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".notifold.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Grouping settings.
    #[serde(default)]
    pub grouping: GroupingConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path. Reports go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Grouping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Timezone for calendar days: "local", "utc" or an offset like "+02:00".
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// What to do with malformed records: "skip" or "fail".
    #[serde(default)]
    pub on_malformed: MalformedPolicy,

    /// Notification types to leave out before grouping.
    #[serde(default)]
    pub exclude_types: Vec<String>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            on_malformed: MalformedPolicy::default(),
            exclude_types: Vec::new(),
        }
    }
}

fn default_timezone() -> String {
    "local".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Rows in the most active accounts table.
    #[serde(default = "default_top_accounts")]
    pub top_accounts: usize,

    /// List skipped records at the end of the report.
    #[serde(default = "default_true")]
    pub show_skipped: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            top_accounts: default_top_accounts(),
            show_skipped: true,
        }
    }
}

fn default_top_accounts() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.notifold.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if let Some(ref zone) = args.timezone {
            self.grouping.timezone = zone.clone();
        }

        if args.strict {
            self.grouping.on_malformed = MalformedPolicy::Fail;
        }

        if let Some(ref types) = args.exclude_types {
            self.grouping.exclude_types = types.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        if let Some(top) = args.top {
            self.report.top_accounts = top;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
