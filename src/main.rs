mod config;
mod db;
mod http;
mod listener;
mod models;
mod processor;
mod protocol;

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use config::{AppConfig, StoreBackend};
use db::memory::MemoryPositionStore;
use db::postgres::PgPositionStore;
use db::PositionStore;
use processor::message_processor::MessageProcessor;
use processor::query_service::QueryService;
use processor::trip_segmenter::TripSegmenter;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting geolog server...");

    // Init store
    let store: Arc<dyn PositionStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
            info!("Connected to database");
            db::ensure_schema(&pool).await?;
            Arc::new(PgPositionStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, positions are lost on restart");
            Arc::new(MemoryPositionStore::new())
        }
    };

    let trip_gap = Duration::try_seconds(config.trip_gap_seconds)
        .filter(|gap| *gap > Duration::zero())
        .context("TRIP_GAP_SECONDS must be a positive number of seconds")?;

    let processor = Arc::new(MessageProcessor::new(store.clone()));
    let state = http::AppState {
        queries: QueryService::new(store, TripSegmenter::new(trip_gap)),
    };

    tokio::try_join!(
        listener::start_tracker_listener(config.tracker_listen_addr, processor, config.read_buffer_size),
        http::serve(config.http_listen_addr, state),
    )?;

    Ok(())
}
