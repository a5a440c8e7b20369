//! Spread-Mapper main entry point
//!
//! This is the command-line interface for the amplification crawler.

use clap::Parser;
use std::path::{Path, PathBuf};
use spread_mapper::config::{load_config_with_hash, validate, Config};
use spread_mapper::crawler::run_crawl;
use spread_mapper::output::print_statistics;
use spread_mapper::{load_target_urls, ConfigError, InputError};
use tracing_subscriber::EnvFilter;

/// Spread-Mapper: maps who amplifies a set of URLs
///
/// Searches recent posts referencing each URL in the input CSV, then fetches
/// the followers of every original poster and the recent posts of each
/// follower, staying under the remote service's rate limits.
#[derive(Parser, Debug)]
#[command(name = "spread-mapper")]
#[command(version)]
#[command(about = "Maps who amplifies a set of URLs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Location of the url CSV file (overrides [input] file)
    #[arg(short, long, value_name = "CSV")]
    file: Option<PathBuf>,

    /// Name of the column containing the urls (overrides [input] url-col)
    #[arg(long)]
    url_col: Option<String>,

    /// Base directory for all stage output files (overrides [output] directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Bearer token for the remote API
    #[arg(long, env = "BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the urls that would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_effective_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Input errors are reported before any network activity
    let input_path = config
        .input
        .file
        .as_deref()
        .map(PathBuf::from)
        .ok_or(InputError::NoFile)?;
    let targets = match load_target_urls(&input_path, &config.input.url_col) {
        Ok(urls) => urls,
        Err(e) => {
            tracing::error!("Failed to load urls from {}: {}", input_path.display(), e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &input_path, &targets);
        return Ok(());
    }

    let token = cli.bearer_token.clone().ok_or(ConfigError::MissingToken)?;
    handle_crawl(config, &token, &targets).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spread_mapper=info,warn"),
            1 => EnvFilter::new("spread_mapper=debug,info"),
            2 => EnvFilter::new("spread_mapper=trace,debug"),
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

/// Loads the config file (or defaults) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        None => Config::default(),
    };

    if let Some(file) = &cli.file {
        config.input.file = Some(file.to_string_lossy().into_owned());
    }
    if let Some(url_col) = &cli.url_col {
        config.input.url_col = url_col.clone();
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.to_string_lossy().into_owned();
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the settings and the de-duplicated url list
fn handle_dry_run(config: &Config, input_path: &Path, targets: &[String]) {
    println!("=== Spread-Mapper Dry Run ===\n");

    println!("Input:");
    println!("  File: {}", input_path.display());
    println!("  Column: {}", config.input.url_col);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\nRemote:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Pacing delay: {}ms", config.crawler.pacing_delay_ms);
    println!("  Skip failed items: {}", config.crawler.skip_failed_items);

    println!("\nPage sizes:");
    println!("  Search: {}", config.search.max_results);
    println!("  Followers: {}", config.followers.max_results);
    println!("  Follower posts: {}", config.posts.max_results);

    println!("\nTargets ({}):", targets.len());
    for (index, url) in targets.iter().enumerate() {
        println!("  [{}] {} -> {}", index, url, config.search.query_for(url));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    token: &str,
    targets: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Crawling {} urls into {}",
        targets.len(),
        config.output.directory
    );

    match run_crawl(config, token, targets).await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
