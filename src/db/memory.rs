//! Process-local store, used when no database is configured and in tests.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PositionStore, TimeRange};
use crate::models::position::{LastPosition, PositionHistoryEntry};

#[derive(Default)]
pub struct MemoryPositionStore {
    last_positions: RwLock<HashMap<String, LastPosition>>,
    history: RwLock<HashMap<String, Vec<PositionHistoryEntry>>>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    async fn last_position(&self, imei: &str) -> Result<Option<LastPosition>> {
        Ok(self.last_positions.read().await.get(imei).cloned())
    }

    async fn upsert_last_position(&self, position: &LastPosition) -> Result<()> {
        self.last_positions
            .write()
            .await
            .insert(position.imei.clone(), position.clone());
        Ok(())
    }

    async fn append_history(&self, entry: &PositionHistoryEntry) -> Result<()> {
        self.history
            .write()
            .await
            .entry(entry.imei.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn history(&self, imei: &str, range: Option<TimeRange>) -> Result<Vec<PositionHistoryEntry>> {
        let history = self.history.read().await;
        let mut entries: Vec<PositionHistoryEntry> = history
            .get(imei)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| range.map_or(true, |r| r.contains(e.created)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        // stable, so equal timestamps keep insertion order
        entries.sort_by_key(|e| e.created);
        Ok(entries)
    }
}
