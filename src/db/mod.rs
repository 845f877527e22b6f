use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::models::position::{LastPosition, PositionHistoryEntry};

pub mod memory;
pub mod postgres;
pub mod queries;

pub type DbPool = Pool<Postgres>;

pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn ensure_schema(pool: &DbPool) -> Result<()> {
    for statement in [
        queries::CREATE_LAST_POSITIONS,
        queries::CREATE_POSITION_HISTORY,
        queries::CREATE_POSITION_HISTORY_INDEX,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}

/// Half-open `[from, to)` interval over `created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TimeRange {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.from <= ts && ts < self.to
    }
}

/// Persistence contract for device positions.
///
/// `last_positions` is keyed by IMEI with upsert semantics;
/// `position_history` is append-only and read back ordered by `created`.
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn last_position(&self, imei: &str) -> Result<Option<LastPosition>>;

    async fn upsert_last_position(&self, position: &LastPosition) -> Result<()>;

    async fn append_history(&self, entry: &PositionHistoryEntry) -> Result<()>;

    /// History of one device sorted by `created` ascending, optionally
    /// restricted to `range`.
    async fn history(&self, imei: &str, range: Option<TimeRange>) -> Result<Vec<PositionHistoryEntry>>;
}
