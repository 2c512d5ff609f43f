//! cyclewatch - Market-cycle risk monitor
//!
//! Keeps a periodically refreshed snapshot of cycle-top indicators, each
//! scored by its proximity to a risk zone, plus the aggregate summary.
//!
//! # Usage
//! ```sh
//! REFRESH_INTERVAL_SECS=600 cargo run -- run
//! cargo run -- once
//! cargo run -- catalog
//! ```
//!
//! # Environment Variables
//! - `REFRESH_INTERVAL_SECS` - Seconds between refresh cycles (default: 600)
//! - `STALENESS_THRESHOLD_SECS` - Age after which the snapshot is reported stale (default: 1800)
//! - `CATALOG_PATH` - TOML indicator catalog (default: built-in catalog)
//! - `SNAPSHOT_PATH` - Persisted JSON mirror, empty to disable (default: indicators_data.json)
//! - `OBSERVABILITY_ENABLED` - Enable summary reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between summary outputs (default: 60)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cyclewatch::application::{RefreshCache, RefreshScheduler};
use cyclewatch::config::Config;
use cyclewatch::domain::catalog::IndicatorCatalog;
use cyclewatch::domain::ports::ValueSource;
use cyclewatch::infrastructure::observability::{Metrics, SummaryReporter};
use cyclewatch::infrastructure::persistence::SnapshotStore;
use cyclewatch::infrastructure::sentiment::AlternativeMeSource;
use cyclewatch::infrastructure::sources::{LayeredValueSource, StaticValueSource};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Market-cycle risk monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh on a schedule until Ctrl+C (default)
    Run,
    /// Run a single refresh cycle and print the snapshot as JSON
    Once {
        /// Print only the summary
        #[arg(long)]
        summary_only: bool,
    },
    /// Validate and list the indicator catalog
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let catalog = load_catalog(&config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, catalog).await,
        Commands::Once { summary_only } => once(config, catalog, summary_only).await,
        Commands::Catalog => {
            print_catalog(&catalog);
            Ok(())
        }
    }
}

fn load_catalog(config: &Config) -> Result<Arc<IndicatorCatalog>> {
    let catalog = match &config.refresh.catalog_path {
        Some(path) => {
            info!("Loading indicator catalog from {:?}", path);
            IndicatorCatalog::load(path)
                .with_context(|| format!("Failed to load catalog {:?}", path))?
        }
        None => IndicatorCatalog::builtin().context("Built-in catalog is invalid")?,
    };
    catalog
        .check_scoring(&config.scoring.to_scoring())
        .context("Catalog conflicts with scoring configuration")?;

    info!("Catalog loaded: {} indicators", catalog.len());
    Ok(Arc::new(catalog))
}

fn build_source(config: &Config, catalog: &IndicatorCatalog) -> Arc<dyn ValueSource> {
    let sources = &config.sources;
    let mut layered = LayeredValueSource::new(sources.call_timeout())
        .with_fallback(Arc::new(StaticValueSource::from_catalog(catalog)));

    if sources.fear_greed_enabled {
        if catalog.get(&sources.fear_greed_indicator_id).is_some() {
            let live = AlternativeMeSource::new(
                sources.fear_greed_url.clone(),
                sources.fear_greed_indicator_id.clone(),
                sources.call_timeout(),
            );
            layered = layered.with_live(sources.fear_greed_indicator_id.clone(), Arc::new(live));
            info!(
                "Live source registered: alternative.me -> {}",
                sources.fear_greed_indicator_id
            );
        } else {
            warn!(
                "FEAR_GREED_INDICATOR_ID {:?} is not in the catalog; live source disabled",
                sources.fear_greed_indicator_id
            );
        }
    }

    Arc::new(layered)
}

fn build_cache(
    config: &Config,
    catalog: Arc<IndicatorCatalog>,
    metrics: Option<Metrics>,
    store: Option<&SnapshotStore>,
) -> RefreshCache {
    let source = build_source(config, &catalog);
    let mut cache = RefreshCache::new(catalog, source)
        .with_scoring(config.scoring.to_scoring())
        .with_status_bands(config.scoring.to_status_bands())
        .with_staleness_threshold(config.refresh.staleness_threshold());

    if let Some(metrics) = metrics {
        cache = cache.with_metrics(metrics);
    }

    if let Some(store) = store {
        match store.load() {
            Ok(Some(snapshot)) => cache = cache.with_initial_snapshot(snapshot),
            Ok(None) => info!("No persisted snapshot at {:?}", store.path()),
            Err(e) => warn!("Ignoring unreadable snapshot {:?}: {:#}", store.path(), e),
        }
    }

    cache
}

async fn run(config: Config, catalog: Arc<IndicatorCatalog>) -> Result<()> {
    info!("cyclewatch {} starting...", env!("CARGO_PKG_VERSION"));

    let metrics = Metrics::new()?;
    let store = config.refresh.snapshot_path.clone().map(SnapshotStore::new);
    let cache = Arc::new(build_cache(
        &config,
        catalog,
        Some(metrics.clone()),
        store.as_ref(),
    ));

    info!("Running startup refresh...");
    match cache.force_refresh().await {
        Ok(snapshot) => {
            if let Some(store) = &store
                && let Err(e) = store.save(&snapshot)
            {
                warn!("Failed to persist startup snapshot: {:#}", e);
            }
        }
        Err(e) => warn!("Startup refresh failed, serving previous snapshot if any: {}", e),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut scheduler = RefreshScheduler::new(cache.clone(), config.refresh.refresh_interval());
    if let Some(store) = store {
        scheduler = scheduler.with_store(store);
    }
    let scheduler_handle = scheduler.spawn(shutdown_rx);

    if config.observability.enabled {
        let reporter = SummaryReporter::new(
            cache.clone(),
            Some(metrics),
            config.observability.interval_seconds,
        );
        tokio::spawn(async move {
            reporter.run().await;
        });
        info!(
            "Summary reporter started (interval: {}s)",
            config.observability.interval_seconds
        );
    } else {
        info!("Summary reporting disabled.");
    }

    info!("Running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");

    shutdown_tx.send(true).ok();
    scheduler_handle.await.ok();

    Ok(())
}

async fn once(config: Config, catalog: Arc<IndicatorCatalog>, summary_only: bool) -> Result<()> {
    let store = config.refresh.snapshot_path.clone().map(SnapshotStore::new);
    let cache = build_cache(&config, catalog, None, None);

    let snapshot = cache.force_refresh().await?;
    if let Some(store) = &store {
        store.save(&snapshot)?;
    }

    let json = if summary_only {
        serde_json::to_string_pretty(snapshot.summary())?
    } else {
        serde_json::to_string_pretty(snapshot.as_ref())?
    };
    println!("{}", json);
    Ok(())
}

fn print_catalog(catalog: &IndicatorCatalog) {
    println!(
        "{:<36} {:>12} {:<28} {:>10}",
        "INDICATOR", "REFERENCE", "DIRECTION", "FALLBACK"
    );
    for def in catalog.iter() {
        let fallback = def
            .fallback_value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36} {:>12} {:<28} {:>10}",
            def.id,
            format!("{}{}", def.reference_threshold, def.unit),
            def.direction.to_string(),
            fallback
        );
    }
}
