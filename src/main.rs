//! Post-Harvest main entry point
//!
//! This is the command-line interface for the Post-Harvest collector.

use anyhow::Context;
use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use post_harvest::collector::{normalize_account, CollectionReport, CollectionRequest, Collector};
use post_harvest::config::{load_config_with_hash, validate, Config};
use post_harvest::output::{export_csv, load_statistics, print_statistics, EXPORT_FILE_NAME};
use post_harvest::storage::{open_existing_store, store_path};
use post_harvest::CollectError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lower bound used when neither `--since` nor the config names one
const DEFAULT_START_DATE: (i32, u32, u32) = (2024, 2, 24);

/// Post-Harvest: a resumable post history collector
///
/// Post-Harvest walks an account's post history one calendar month at a
/// time, stores every post once, and picks up where the last run stopped.
#[derive(Parser, Debug)]
#[command(name = "post-harvest")]
#[command(version)]
#[command(about = "A resumable, time-windowed post history collector", long_about = None)]
struct Cli {
    /// Account handle to collect (a leading @ is accepted)
    #[arg(value_name = "ACCOUNT")]
    account: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First day to collect (YYYY-MM-DD, inclusive)
    #[arg(long, value_name = "DATE")]
    since: Option<NaiveDate>,

    /// Day to stop at (YYYY-MM-DD, exclusive; defaults to tomorrow)
    #[arg(long, value_name = "DATE")]
    until: Option<NaiveDate>,

    /// Search API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Walk already covered months again
    #[arg(long)]
    recheck: bool,

    /// Show the window plan without contacting the API
    #[arg(long, conflicts_with_all = ["stats", "export_csv"])]
    dry_run: bool,

    /// Show statistics from the store and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_csv"])]
    stats: bool,

    /// Export collected posts as CSV and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats"])]
    export_csv: Option<Option<PathBuf>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_configuration(cli.config.as_deref())?;
    let account = normalize_account(&cli.account)?;

    if cli.stats {
        handle_stats(&config, &account)?;
    } else if let Some(path) = &cli.export_csv {
        handle_export_csv(&config, &account, path.as_deref())?;
    } else {
        let request = build_request(&cli, &config, account)?;
        if cli.dry_run {
            handle_dry_run(config, request, &config_hash)?;
        } else {
            handle_collect(config, request, &config_hash).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("post_harvest=info,warn"),
            1 => EnvFilter::new("post_harvest=debug,info"),
            2 => EnvFilter::new("post_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if one was given, otherwise the built-in defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, String)> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, hash))
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            tracing::debug!("No configuration file given, using defaults");
            Ok((config, "default".to_string()))
        }
    }
}

/// Resolves the date range: CLI flags, then config, then built-in defaults
fn build_request(
    cli: &Cli,
    config: &Config,
    account: String,
) -> anyhow::Result<CollectionRequest> {
    let default_start = NaiveDate::from_ymd_opt(
        DEFAULT_START_DATE.0,
        DEFAULT_START_DATE.1,
        DEFAULT_START_DATE.2,
    )
    .context("invalid default start date")?;
    let tomorrow = Local::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .context("date overflow computing tomorrow")?;

    let start = cli
        .since
        .or(config.collection.start_date)
        .unwrap_or(default_start);
    let end = cli.until.or(config.collection.end_date).unwrap_or(tomorrow);

    if start >= end {
        return Err(CollectError::InvalidRange(format!(
            "start {} is not before end {}",
            start, end
        ))
        .into());
    }

    Ok(CollectionRequest {
        account,
        start,
        end,
        api_key: cli.api_key.clone(),
        recheck: cli.recheck,
    })
}

/// Handles the --dry-run mode: shows the window plan without fetching
fn handle_dry_run(
    config: Config,
    request: CollectionRequest,
    config_hash: &str,
) -> anyhow::Result<()> {
    println!("=== Post-Harvest Dry Run ===\n");

    println!("Account: @{}", request.account);
    println!("Range: {} to {} (exclusive)", request.start, request.end);
    println!(
        "Store: {}",
        store_path(Path::new(&config.output.data_dir), &request.account).display()
    );
    println!("Endpoint: {}", config.api.endpoint);
    println!(
        "API key: {}",
        if request.api_key.is_some() { "set" } else { "missing" }
    );
    println!();

    println!("Pacing:");
    println!("  Request timeout: {}ms", config.pacing.request_timeout);
    println!("  Inter-request delay: {}ms", config.pacing.inter_request_delay);
    println!("  Inter-window delay: {}ms", config.pacing.inter_window_delay);
    println!(
        "  Retries: {} attempts, {}ms backoff",
        config.pacing.max_attempts, config.pacing.retry_backoff
    );
    println!("  Page cap: {} per window", config.pacing.max_pages_per_window);
    println!();

    let recheck = request.recheck;
    let collector = Collector::new(config, request, config_hash)?;
    let plan = collector.plan();

    println!("Windows ({}):", plan.len());
    for planned in &plan {
        let mark = if planned.covered && !recheck {
            "covered, skip"
        } else {
            "pending"
        };
        println!("  - {} [{}]", planned.window, mark);
    }

    let pending = plan.iter().filter(|p| recheck || !p.covered).count();
    println!("\n✓ Configuration is valid");
    println!("✓ Would walk {} of {} windows", pending, plan.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the store
fn handle_stats(config: &Config, account: &str) -> anyhow::Result<()> {
    let data_dir = Path::new(&config.output.data_dir);
    println!("Store: {}\n", store_path(data_dir, account).display());

    let store = open_existing_store(data_dir, account)?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-csv mode: writes every stored post to a CSV file
fn handle_export_csv(config: &Config, account: &str, path: Option<&Path>) -> anyhow::Result<()> {
    let data_dir = Path::new(&config.output.data_dir);
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => data_dir.join(account).join(EXPORT_FILE_NAME),
    };

    let store = open_existing_store(data_dir, account)?;
    let rows = export_csv(&store, &target)
        .with_context(|| format!("failed to export to {}", target.display()))?;

    println!("✓ Exported {} posts to: {}", rows, target.display());
    Ok(())
}

/// Handles the main collection operation
async fn handle_collect(
    config: Config,
    request: CollectionRequest,
    config_hash: &str,
) -> anyhow::Result<()> {
    let mut collector = Collector::new(config, request, config_hash)?;

    let outcome = tokio::select! {
        result = collector.run() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(report)) => {
            log_report(&report);
            Ok(())
        }
        Some(Err(e)) => {
            tracing::error!("Collection failed: {}", e);
            Err(e.into())
        }
        None => {
            tracing::warn!("Interrupted, stopping");
            collector.mark_interrupted()?;
            Ok(())
        }
    }
}

fn log_report(report: &CollectionReport) {
    tracing::info!(
        "Done: {} windows ({} covered, {} skipped, {} partial); {} new posts, {} duplicates, {} total",
        report.windows_total,
        report.covered,
        report.skipped,
        report.partial,
        report.new_records,
        report.duplicates,
        report.total_records
    );

    if !report.uncovered_months.is_empty() {
        tracing::warn!(
            "Months left uncovered, re-run to retry: {}",
            report.uncovered_months.join(", ")
        );
    }
}
