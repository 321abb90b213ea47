//! # mlbb_ingest
//!
//! Scrapes Mobile Legends: Bang Bang hero pages from a community wiki into
//! structured records, persists them as a resumable JSON run, and uploads
//! them into the hero database.
//!
//! ## Usage
//!
//! ```sh
//! mlbb_ingest scrape 50 5
//! mlbb_ingest report
//! mlbb_ingest --remote upload
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: enumerate hero identifiers from the category page
//!    (falling back to a built-in list)
//! 2. **Scraping**: fetch each hero page through the rate-limited retry
//!    client and extract every facet, one batch at a time
//! 3. **Persistence**: re-write `heroes-data.json` after each batch so runs
//!    can be resumed
//! 4. **Upload**: upsert hero identities, then each facet, through D1
//!    (`wrangler`), a local SQLite mirror, or the HTTP API

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod models;
mod orchestrator;
mod outputs;
mod scrapers;
mod upload;
mod utils;

use cli::{Cli, Command, UploadTarget};
use config::AppConfig;
use error::PipelineError;
use fetch::{HttpFetch, RetryFetch};
use models::ScrapeRun;
use orchestrator::{BatchOrchestrator, ScrapeOptions};
use outputs::json::JsonRunStore;
use outputs::{report, sql};
use upload::api::ApiClient;
use upload::{SqlSink, SqliteSink, UploadOptions, Uploader, WranglerSink};
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("mlbb_ingest starting up");

    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    let mut config = AppConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let result = dispatch(&config, &args.command).await;

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, secs = elapsed.as_secs(), "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

/// Layer CLI flags (and their environment variables) over the loaded config.
fn apply_overrides(config: &mut AppConfig, args: &Cli) {
    if let Some(dir) = &args.output_dir {
        config.pipeline.output_dir = dir.clone();
    }
    if let Some(path) = &args.sqlite {
        config.upload.sqlite_path = Some(path.clone());
    }
    if let Some(database) = &args.database {
        config.upload.d1_database = database.clone();
    }
    if args.remote {
        config.upload.remote = true;
    }
    if let Some(url) = &args.api_url {
        config.upload.api_url = Some(url.clone());
    }
}

async fn dispatch(config: &AppConfig, command: &Command) -> Result<(), Box<dyn Error>> {
    let store = JsonRunStore::new(&config.pipeline.output_dir);
    match command {
        Command::Scrape {
            max_heroes,
            batch_size,
            fresh,
        } => {
            let mut options = ScrapeOptions::from_pipeline(&config.pipeline);
            if let Some(max) = max_heroes {
                options.max_heroes = *max;
            }
            if let Some(size) = batch_size {
                options.batch_size = *size;
            }
            options.skip_existing = !fresh;
            scrape(config, &store, &options).await
        }
        Command::Continue => {
            info!("Continuing previous scraping session");
            scrape(config, &store, &ScrapeOptions::resume(&config.pipeline)).await
        }
        Command::Report => {
            let run = store.load_required().await?;
            let rendered = report::render_report(&run);
            println!("{rendered}");
            report::save_report(store.dir(), &rendered).await?;
            Ok(())
        }
        Command::Test => match &config.upload.sqlite_path {
            Some(path) => test_targets(config, &SqliteSink::open(path)?).await,
            None => test_targets(config, &wrangler(config)).await,
        },
        Command::Upload { batch_size, target } => {
            let run = store.load_required().await?;
            let mut options = UploadOptions::from_config(&config.upload);
            if let Some(size) = batch_size {
                options.batch_size = *size;
            }
            info!(heroes = run.heroes.len(), ?target, "Uploading persisted run");
            match (target, &config.upload.sqlite_path) {
                (UploadTarget::Api, _) => upload_api(config, &run, &options).await,
                (_, Some(path)) => upload_sql(&SqliteSink::open(path)?, &run, options, *target).await,
                (_, None) => upload_sql(&wrangler(config), &run, options, *target).await,
            }
        }
        Command::Sql => {
            let run = store.load_required().await?;
            ensure_writable_dir(store.dir()).await?;
            sql::write_import_sql(store.dir(), &run, &config.upload.default_role).await?;
            Ok(())
        }
    }
}

fn wrangler(config: &AppConfig) -> WranglerSink {
    WranglerSink::new(&config.upload.d1_database, config.upload.remote)
}

#[instrument(level = "info", skip_all, fields(dir = %store.dir().display()))]
async fn scrape(
    config: &AppConfig,
    store: &JsonRunStore,
    options: &ScrapeOptions,
) -> Result<(), Box<dyn Error>> {
    // Fail before any network traffic if progress could never be saved.
    if let Err(e) = ensure_writable_dir(store.dir()).await {
        error!(
            path = %store.dir().display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let client = RetryFetch::from_config(HttpFetch::new(&config.scraper)?, &config.scraper);
    let orchestrator = BatchOrchestrator::new(&client, &config.scraper.base_url, store);
    let run = orchestrator.run(options).await?;

    if !run.errors.is_empty() {
        warn!(
            failed = run.errors.len(),
            heroes = ?run.errors.iter().map(|f| f.hero.as_str()).collect::<Vec<_>>(),
            "Some heroes could not be scraped"
        );
    }
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn test_targets<S: SqlSink>(config: &AppConfig, sink: &S) -> Result<(), Box<dyn Error>> {
    let count = upload::hero_count(sink).await.map_err(PipelineError::from)?;
    info!(heroes = count, "SQL sink reachable");

    if let Some(url) = &config.upload.api_url {
        let client = ApiClient::new(url, &config.upload.default_role, config.scraper.timeout())?;
        let listed = client.test_connection().await?;
        info!(heroes = listed, "HTTP API reachable");
    }
    Ok(())
}

async fn upload_sql<S: SqlSink>(
    sink: &S,
    run: &ScrapeRun,
    options: UploadOptions,
    target: UploadTarget,
) -> Result<(), Box<dyn Error>> {
    let existing = upload::hero_count(sink).await.map_err(PipelineError::from)?;
    info!(heroes = existing, "SQL sink reachable");

    let uploader = Uploader::new(sink, options);
    if matches!(target, UploadTarget::All | UploadTarget::Identities) {
        let totals = uploader.upload_identities(&run.heroes).await;
        info!(%totals, "Identity step finished");
    }
    if matches!(target, UploadTarget::All | UploadTarget::Facets) {
        let totals = uploader
            .upload_facets(&run.heroes)
            .await
            .map_err(PipelineError::from)?;
        info!(%totals, "Facet step finished");
    }
    for (table, count) in uploader.verify().await {
        match count {
            Some(count) => info!(table, count, "Rows in table"),
            None => warn!(table, "Row count unavailable"),
        }
    }
    Ok(())
}

async fn upload_api(
    config: &AppConfig,
    run: &ScrapeRun,
    options: &UploadOptions,
) -> Result<(), Box<dyn Error>> {
    let url = config
        .upload
        .api_url
        .as_deref()
        .ok_or("the api target needs --api-url (or MLBB_API_URL)")?;
    let client = ApiClient::new(url, &options.default_role, config.scraper.timeout())?;
    let totals = client
        .upload_all(&run.heroes, options.batch_size, options.delay_between_batches)
        .await;
    info!(
        successful = totals.successful,
        failed = totals.failed,
        "API upload finished"
    );
    Ok(())
}
