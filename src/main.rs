//! quizpack-harvest command line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quizpack_harvest::{Config, DuplicateKeyPolicy, Harvester};

#[derive(Parser, Debug)]
#[command(name = "quizpack-harvest")]
#[command(version, about = "Harvest quizpack questions and their answer options into a CSV file")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session cookie (overrides the config file)
    #[arg(long, env = "SQ_SESSION", hide_env_values = true)]
    session_cookie: Option<String>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Category filter to query (repeatable; replaces the configured list)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Maximum concurrent quizpack fetches
    #[arg(long)]
    fetch_concurrency: Option<usize>,

    /// Maximum concurrent option lookups
    #[arg(long)]
    enrich_concurrency: Option<usize>,

    /// Fetch each quizpack once even if several categories list it
    #[arg(long)]
    dedupe_keys: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> quizpack_harvest::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(cookie) = self.session_cookie {
            config.api.session_cookie = cookie;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if !self.categories.is_empty() {
            config.pipeline.categories = self.categories;
        }
        if let Some(n) = self.fetch_concurrency {
            config.pipeline.fetch_concurrency = n;
        }
        if let Some(n) = self.enrich_concurrency {
            config.pipeline.enrich_concurrency = n;
        }
        if self.dedupe_keys {
            config.pipeline.duplicate_keys = DuplicateKeyPolicy::Skip;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quizpack_harvest={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let harvester = match Harvester::new(config) {
        Ok(harvester) => harvester,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start harvest");
            return ExitCode::FAILURE;
        }
    };

    let settings = harvester.config();
    tracing::info!(
        categories = ?settings.pipeline.categories,
        fetch_concurrency = settings.pipeline.fetch_concurrency,
        enrich_concurrency = settings.pipeline.enrich_concurrency,
        output = %settings.output_path.display(),
        "Starting harvest"
    );

    match harvester.run().await {
        Ok(summary) => {
            tracing::info!(
                keys = summary.keys,
                failed_keys = summary.failed_keys,
                skipped_items = summary.skipped_items,
                failed_lookups = summary.failed_lookups,
                "Done! Saved {} rows to {}",
                summary.rows,
                summary.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Harvest failed");
            ExitCode::FAILURE
        }
    }
}
