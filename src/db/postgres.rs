use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;

use super::{queries, DbPool, PositionStore, TimeRange};
use crate::models::position::{LastPosition, PositionHistoryEntry};

/// PostgreSQL backed store over the `last_positions` and
/// `position_history` tables.
pub struct PgPositionStore {
    pool: DbPool,
}

impl PgPositionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PositionStore for PgPositionStore {
    async fn last_position(&self, imei: &str) -> Result<Option<LastPosition>> {
        let row = sqlx::query_as::<_, LastPosition>(queries::SELECT_LAST_POSITION)
            .bind(imei)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_last_position(&self, position: &LastPosition) -> Result<()> {
        sqlx::query(queries::UPSERT_LAST_POSITION)
            .bind(&position.imei)
            .bind(position.last_seen)
            .bind(position.latitude)
            .bind(position.longitude)
            .bind(position.speed_kmh)
            .bind(position.bearing_deg)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_history(&self, entry: &PositionHistoryEntry) -> Result<()> {
        sqlx::query(queries::INSERT_POSITION_HISTORY)
            .bind(&entry.imei)
            .bind(entry.created)
            .bind(entry.latitude)
            .bind(entry.longitude)
            .bind(entry.speed_kmh)
            .bind(entry.bearing_deg)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn history(&self, imei: &str, range: Option<TimeRange>) -> Result<Vec<PositionHistoryEntry>> {
        let entries = match range {
            Some(range) => {
                sqlx::query_as::<_, PositionHistoryEntry>(queries::SELECT_POSITION_HISTORY_RANGE)
                    .bind(imei)
                    .bind(range.from)
                    .bind(range.to)
                    .fetch(&self.pool)
                    .try_collect::<Vec<_>>()
                    .await?
            }
            None => {
                sqlx::query_as::<_, PositionHistoryEntry>(queries::SELECT_POSITION_HISTORY)
                    .bind(imei)
                    .fetch(&self.pool)
                    .try_collect::<Vec<_>>()
                    .await?
            }
        };
        Ok(entries)
    }
}
