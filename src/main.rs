use clap::Parser;
use newest_listing::engine::snapshot::SnapshotEngine;
use newest_listing::engine::webdriver::WebDriverEngine;
use newest_listing::error::{ConfigError, NavigationFailure};
use newest_listing::report::{self, ReportOptions};
use newest_listing::{Harvest, ListingConfig, Metrics, Pipeline};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

mod args;
use args::Args;

#[derive(Debug, Error)]
enum AppError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("could not start a WebDriver session")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("could not read saved pages")]
    Snapshot(#[source] std::io::Error),

    #[error(transparent)]
    Navigation(#[from] NavigationFailure),

    #[error("run did not finish within {0:?}")]
    TotalTimeout(Duration),

    #[error("could not write report")]
    Output(#[source] std::io::Error),
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("error: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = load_config(&args)?;
    let start_url = args.url.clone().unwrap_or_else(|| config.start_url.clone());
    let metrics = Arc::new(Metrics::new());

    let start_time = std::time::Instant::now();
    ::log::info!("Starting run for {}", start_url);

    let harvest = if args.from_html.is_empty() {
        eprintln!("Note: reading a live listing requires a WebDriver server (e.g., ChromeDriver).");
        eprintln!(
            "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
        );

        let engine = WebDriverEngine::connect(&config.webdriver_url, config.headless)
            .await?
            .with_ready_timeout(config.navigation_timeout());
        let mut pipeline = Pipeline::new(engine, &config).with_hook(metrics.clone());
        let result = bounded(args.total_timeout, pipeline.run(&start_url)).await;

        // Close the session whatever the outcome
        pipeline.into_engine().close().await;
        result?
    } else {
        let engine = SnapshotEngine::from_files(&args.from_html).map_err(AppError::Snapshot)?;
        let mut pipeline = Pipeline::new(engine, &config).with_hook(metrics.clone());
        bounded(args.total_timeout, pipeline.run(&start_url)).await?
    };

    let duration = start_time.elapsed();
    ::log::info!(
        "Run complete - {} entries from {} pages in {:.2} seconds ({})",
        harvest.entries.len(),
        harvest.pages_loaded,
        duration.as_secs_f64(),
        harvest.termination
    );
    ::log::debug!(
        "Metrics: {}",
        serde_json::to_string(&metrics.snapshot()).unwrap_or_default()
    );

    print_harvest(&args, &start_url, &harvest).map_err(AppError::Output)
}

/// Configuration file (if any), then environment, then command-line flags
fn load_config(args: &Args) -> Result<ListingConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => ListingConfig::from_file(path)?,
        None => ListingConfig::default(),
    };

    // Override the WebDriver URL with an environment variable if provided
    if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
        if !webdriver_url.is_empty() {
            config.webdriver_url = webdriver_url;
        }
    }

    if let Some(url) = &args.webdriver_url {
        config.webdriver_url = url.clone();
    }
    if let Some(width) = args.batch_width {
        config.batch_width = width;
    }
    if let Some(readiness) = args.readiness {
        config.readiness = readiness;
    }
    if let Some(secs) = args.pagination_timeout {
        config.pagination_timeout_secs = secs;
    }
    if args.headless {
        config.headless = true;
    }

    config.validate()?;
    Ok(config)
}

/// Awaits `run`, optionally bounded by `total_timeout` seconds
async fn bounded<F>(total_timeout: Option<u64>, run: F) -> Result<Harvest, AppError>
where
    F: Future<Output = Result<Harvest, NavigationFailure>>,
{
    match total_timeout {
        Some(secs) => {
            let limit = Duration::from_secs(secs);
            match tokio::time::timeout(limit, run).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(AppError::TotalTimeout(limit)),
            }
        }
        None => Ok(run.await?),
    }
}

fn print_harvest(args: &Args, start_url: &str, harvest: &Harvest) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.json {
        report::write_json(&mut out, &harvest.entries)?;
    } else {
        let options = ReportOptions {
            links_base: if args.links {
                Url::parse(start_url).ok()
            } else {
                None
            },
        };
        report::write_ranked(&mut out, &harvest.entries, &options)?;
    }
    out.flush()
}
