//! fin-track server
//!
//! Sharded personal-finance ledger with an event-driven stats cache.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use fintrack_core::cache::MemoryStatsCache;
use fintrack_core::entities::PgLedgerRepository;
use fintrack_core::events::snapshot_queue;
use fintrack_core::processors::SnapshotWorker;
use fintrack_core::services::{AnalyticsService, TransactionService};
use fintrack_core::sharding::{ShardConfig, ShardRouter};
use fintrack_sdk::client::LedgerClient;
use server::{build_router, run_server};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// fin-track - sharded transaction ledger and stats service
#[derive(Parser, Debug)]
#[command(name = "fintrack-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./fintrack-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on every shard on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting fintrack-server v{}", env!("CARGO_PKG_VERSION"));

    let file_config = config::load(&args.config).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    let listen_addr = args.listen.unwrap_or(file_config.listen);
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Connect every shard up front; a partial topology is useless.
    let shard_configs: Vec<ShardConfig> = file_config
        .shards
        .iter()
        .map(|s| ShardConfig {
            name: s.name.clone(),
            url: s.url.clone(),
            buckets: s.buckets,
        })
        .collect();

    tracing::info!(shards = shard_configs.len(), "Connecting to shards...");
    let router = Arc::new(ShardRouter::connect(&shard_configs).await.map_err(|e| {
        tracing::error!("Failed to connect shard topology: {}", e);
        e
    })?);
    tracing::info!("All shard connections established");

    if args.migrate {
        for (name, pool) in router.shards() {
            tracing::info!(shard = %name, "Running database migrations...");
            sqlx::migrate!("../migrations").run(pool).await?;
        }
        tracing::info!("Migrations completed successfully");
    }

    // Wire up the snapshot pipeline: write service publishes, workers
    // consume into the stats cache.
    let (queue, queue_receiver) = snapshot_queue(file_config.channel.buffer);
    let cache = Arc::new(MemoryStatsCache::new(Duration::from_secs(
        file_config.cache.ttl_secs,
    )));

    let repo = Arc::new(PgLedgerRepository::new(router.clone()));
    let write = Arc::new(TransactionService::new(repo, Arc::new(queue)));

    let fetcher = Arc::new(LedgerClient::new(file_config.fetch.base_url.clone()));
    let read = Arc::new(AnalyticsService::new(cache, fetcher));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tracing::info!(
        group = %file_config.channel.group,
        workers = file_config.channel.consumer_workers,
        "Starting snapshot consumer workers"
    );
    let worker_handles: Vec<_> = (0..file_config.channel.consumer_workers)
        .map(|worker_id| {
            let worker = SnapshotWorker::new(
                read.clone(),
                queue_receiver.clone(),
                shutdown_rx.clone(),
                worker_id,
            );
            tokio::spawn(worker.run())
        })
        .collect();

    let router_http = build_router(AppState::new(write, read));

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router_http, listen_addr).await;

    // Stop workers before closing the pools they might still use.
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }

    tracing::info!("Closing shard connections...");
    router.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
