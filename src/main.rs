//! Notifold - Fediverse notification grouper
//!
//! A CLI tool that reads pages of Mastodon notifications and folds them
//! into a compact digest of grouped entries.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable feed, bad config, malformed record with --strict)
//!   2 - Records were skipped and --fail-on-skipped was set

use anyhow::{Context, Result};
use chrono::Utc;
use notifold::cli::{self, Args, OutputFormat};
use notifold::config::{Config, CONFIG_FILE_NAME};
use notifold::grouping::{Aggregator, DayZone};
use notifold::models::ReportMetadata;
use notifold::{feed, report};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Notifold v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Grouping failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .notifold.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the timezone, excluded types and report format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report written to stdout stays clean.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the grouping workflow. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let zone: DayZone = config
        .grouping
        .timezone
        .parse()
        .context("Invalid grouping.timezone")?;
    let policy = config.grouping.on_malformed;

    // Step 1: Read the feed
    let inputs = args.effective_inputs();
    let mut loaded = feed::load_pages(&inputs, policy)?;
    let input_notifications = loaded.notifications.len() + loaded.skipped.len();

    // Step 2: Apply the type filter
    let excluded_kinds = cli::parse_kinds(&config.grouping.exclude_types);
    let excluded = loaded.exclude_kinds(&excluded_kinds);

    // Step 3: Group
    let aggregator = Aggregator::new(zone, policy);
    let aggregation = aggregator.aggregate(&loaded.notifications)?;

    let mut skipped = loaded.skipped;
    skipped.extend(aggregation.skipped);
    if !skipped.is_empty() {
        warn!("{} records were skipped", skipped.len());
    }

    // Step 4: Build and render the report
    let metadata = ReportMetadata {
        sources: loaded.sources,
        generated_at: Utc::now(),
        day_zone: zone.to_string(),
        input_notifications,
        excluded_notifications: excluded,
        skipped_records: skipped.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let skipped_count = skipped.len();
    let listed_skipped = if config.report.show_skipped {
        skipped
    } else {
        Vec::new()
    };

    let digest = report::build_report(
        metadata,
        aggregation.groups,
        listed_skipped,
        config.report.top_accounts,
    );

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&digest)?,
        OutputFormat::Markdown => report::generate_markdown_report(&digest),
    };

    match config.general.output {
        Some(ref path) => {
            report::write_report(&output, Path::new(path))?;
            info!("Report saved to {}", path);
        }
        None => print!("{}", output),
    }

    info!(
        "Folded {} notifications into {} entries",
        digest.summary.total_notifications, digest.summary.total_groups
    );

    if args.fail_on_skipped && skipped_count > 0 {
        eprintln!(
            "\n⛔ {} records were skipped. Failing (exit code 2).",
            skipped_count
        );
        return Ok(2);
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
