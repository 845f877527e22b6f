use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use super::message::PositionReport;

/// Most recent raw sample of a device. One row per IMEI.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LastPosition {
    pub imei: String,
    pub last_seen: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub bearing_deg: f64,
}

/// Append-only history row, written when the stationary dedup allows it.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PositionHistoryEntry {
    pub imei: String,
    pub created: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub bearing_deg: f64,
}

impl LastPosition {
    pub fn from_report(report: &PositionReport, last_seen: NaiveDateTime) -> Self {
        Self {
            imei: report.imei.clone(),
            last_seen,
            latitude: report.latitude,
            longitude: report.longitude,
            speed_kmh: report.speed_kmh,
            bearing_deg: report.bearing_deg,
        }
    }
}

impl PositionHistoryEntry {
    pub fn from_report(report: &PositionReport, created: NaiveDateTime) -> Self {
        Self {
            imei: report.imei.clone(),
            created,
            latitude: report.latitude,
            longitude: report.longitude,
            speed_kmh: report.speed_kmh,
            bearing_deg: report.bearing_deg,
        }
    }
}
