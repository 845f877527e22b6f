use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, error, info};

use crate::db::PositionStore;
use crate::models::message::{PositionReport, TrackerEvent};
use crate::models::position::{LastPosition, PositionHistoryEntry};
use crate::processor::device_locks::DeviceLocks;
use crate::protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Status,
    Recorded { history_appended: bool },
    Ignored,
}

/// Counters for one decoded chunk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSummary {
    pub statuses: usize,
    pub positions: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Applies decoded tracker events to the position store.
pub struct MessageProcessor {
    store: Arc<dyn PositionStore>,
    locks: DeviceLocks,
}

impl MessageProcessor {
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self {
            store,
            locks: DeviceLocks::new(),
        }
    }

    /// Decodes a chunk and ingests every event in it. A failing event is
    /// logged and dropped; the remaining events are still ingested.
    pub async fn process_chunk(&self, chunk: &str) -> ChunkSummary {
        let mut summary = ChunkSummary::default();

        let events = protocol::decode(chunk);
        if events.is_empty() {
            debug!("Not recognized as data: {:?}", chunk);
            return summary;
        }

        for event in events {
            match self.ingest(event).await {
                Ok(IngestOutcome::Status) => summary.statuses += 1,
                Ok(IngestOutcome::Recorded { .. }) => summary.positions += 1,
                Ok(IngestOutcome::Ignored) => summary.ignored += 1,
                Err(e) => {
                    error!("Error recording position: {:#}", e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    pub async fn ingest(&self, event: TrackerEvent) -> anyhow::Result<IngestOutcome> {
        self.ingest_at(event, Utc::now().naive_utc()).await
    }

    /// Same as [`ingest`](Self::ingest) with an explicit receive time.
    pub async fn ingest_at(&self, event: TrackerEvent, now: NaiveDateTime) -> anyhow::Result<IngestOutcome> {
        match event {
            TrackerEvent::Status(status) => {
                info!("Status message from {}: {}", status.imei, status.code);
                Ok(IngestOutcome::Status)
            }
            TrackerEvent::Position(report) => {
                let history_appended = self.record_position(&report, now).await?;
                Ok(IngestOutcome::Recorded { history_appended })
            }
            TrackerEvent::Ignored { record, reason } => {
                debug!("Ignored record ({}): {:?}", reason, record);
                Ok(IngestOutcome::Ignored)
            }
        }
    }

    /// Returns whether a history entry was written.
    async fn record_position(&self, report: &PositionReport, now: NaiveDateTime) -> anyhow::Result<bool> {
        info!(
            "{} at position: {}/{} {} km/h, {}",
            report.imei, report.latitude, report.longitude, report.speed_kmh, report.bearing_deg
        );

        let _guard = self.locks.acquire(&report.imei).await;

        let last_position = self.store.last_position(&report.imei).await?;

        // Consecutive stationary samples only refresh the last position.
        let stationary = report.speed_kmh == 0.0
            && last_position.as_ref().is_some_and(|p| p.speed_kmh == 0.0);

        if stationary {
            info!("Position not changed for {}", report.imei);
        } else {
            self.store
                .append_history(&PositionHistoryEntry::from_report(report, now))
                .await?;
        }

        self.store
            .upsert_last_position(&LastPosition::from_report(report, now))
            .await?;

        Ok(!stationary)
    }
}
