use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::db::{PositionStore, TimeRange};
use crate::models::message::is_valid_imei;
use crate::models::position::{LastPosition, PositionHistoryEntry};
use crate::models::trip::TripRecord;
use crate::processor::trip_segmenter::TripSegmenter;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid device identifier: '{0}'")]
    InvalidImei(String),

    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    #[error("Invalid range: {from} is after {to}")]
    InvalidRange {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Answer to a trip history request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TripHistory {
    /// Raw samples of a ranged request, oldest first.
    Positions(Vec<PositionHistoryEntry>),
    /// Device marker followed by the segmented trips.
    Trips(Vec<TripRecord>),
}

/// Read side over the position store. Never takes the ingestion locks.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn PositionStore>,
    segmenter: TripSegmenter,
}

impl QueryService {
    pub fn new(store: Arc<dyn PositionStore>, segmenter: TripSegmenter) -> Self {
        Self { store, segmenter }
    }

    pub async fn last_position(&self, imei: &str) -> Result<Option<LastPosition>, QueryError> {
        validate_imei(imei)?;
        Ok(self.store.last_position(imei).await?)
    }

    pub async fn trip_history(&self, imei: &str, range: Option<TimeRange>) -> Result<TripHistory, QueryError> {
        validate_imei(imei)?;

        if let Some(range) = range {
            let entries = self.store.history(imei, Some(range)).await?;
            return Ok(TripHistory::Positions(entries));
        }

        let history = self.store.history(imei, None).await?;
        let mut records = vec![TripRecord::Device {
            imei: imei.to_string(),
        }];
        records.extend(self.segmenter.segment(&history).into_iter().map(TripRecord::Trip));
        Ok(TripHistory::Trips(records))
    }
}

fn validate_imei(imei: &str) -> Result<(), QueryError> {
    if !is_valid_imei(imei) {
        return Err(QueryError::InvalidImei(imei.to_string()));
    }
    Ok(())
}

/// Parses `YYYY-MM-DDTHH:MM:SS`, optionally with fractional seconds.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, QueryError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| QueryError::InvalidTimestamp(value.to_string()))
}

pub fn parse_range(from: &str, to: &str) -> Result<TimeRange, QueryError> {
    let from = parse_timestamp(from)?;
    let to = parse_timestamp(to)?;
    if from > to {
        return Err(QueryError::InvalidRange { from, to });
    }
    Ok(TimeRange { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryPositionStore;
    use chrono::{Duration, NaiveDate};

    const IMEI: &str = "012497000326409";

    fn at(secs: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 7, 23)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(secs)
    }

    async fn seeded(offsets: &[i64]) -> QueryService {
        let store = Arc::new(MemoryPositionStore::new());
        for secs in offsets {
            store
                .append_history(&PositionHistoryEntry {
                    imei: IMEI.to_string(),
                    created: at(*secs),
                    latitude: 52.36,
                    longitude: 4.96,
                    speed_kmh: 10.0,
                    bearing_deg: 45.0,
                })
                .await
                .unwrap();
        }
        QueryService::new(store, TripSegmenter::default())
    }

    #[tokio::test]
    async fn test_unknown_device_has_no_last_position() {
        let queries = seeded(&[]).await;
        assert!(queries.last_position(IMEI).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bad_imei_is_rejected() {
        let queries = seeded(&[]).await;
        assert!(matches!(
            queries.last_position("12;DROP").await,
            Err(QueryError::InvalidImei(_))
        ));
        assert!(matches!(
            queries.trip_history("", None).await,
            Err(QueryError::InvalidImei(_))
        ));
    }

    #[tokio::test]
    async fn test_trips_are_prefixed_with_device_marker() {
        let queries = seeded(&[0, 60, 120, 4120, 4180]).await;
        let TripHistory::Trips(records) = queries.trip_history(IMEI, None).await.unwrap() else {
            panic!("expected segmented trips");
        };

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], TripRecord::Device { imei: IMEI.to_string() });
        match (&records[1], &records[2]) {
            (TripRecord::Trip(a), TripRecord::Trip(b)) => {
                assert_eq!(a.points + b.points, 5);
                assert_eq!(a.trip_finish, at(120));
                assert_eq!(b.trip_start, at(4120));
            }
            other => panic!("unexpected records: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ranged_query_returns_raw_half_open_interval() {
        let queries = seeded(&[300, 0, 100, 200, 5000]).await;
        let range = TimeRange {
            from: at(100),
            to: at(300),
        };
        let TripHistory::Positions(entries) = queries.trip_history(IMEI, Some(range)).await.unwrap() else {
            panic!("expected raw positions");
        };

        let created: Vec<_> = entries.iter().map(|e| e.created).collect();
        assert_eq!(created, vec![at(100), at(200)]);
    }

    #[tokio::test]
    async fn test_device_without_history_has_only_marker() {
        let queries = seeded(&[]).await;
        let TripHistory::Trips(records) = queries.trip_history("999", None).await.unwrap() else {
            panic!("expected segmented trips");
        };
        assert_eq!(records, vec![TripRecord::Device { imei: "999".to_string() }]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2012-07-23T00:01:40").unwrap(), at(100));
        assert_eq!(
            parse_timestamp("2012-07-23T00:01:40.500").unwrap(),
            at(100) + Duration::milliseconds(500)
        );
        assert!(matches!(
            parse_timestamp("23/07/2012"),
            Err(QueryError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_parse_range_rejects_inverted_bounds() {
        assert!(parse_range("2012-07-23T00:00:00", "2012-07-24T00:00:00").is_ok());
        assert!(matches!(
            parse_range("2012-07-24T00:00:00", "2012-07-23T00:00:00"),
            Err(QueryError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_trip_response_shape() {
        let records = vec![
            TripRecord::Device { imei: IMEI.to_string() },
            TripRecord::Trip(crate::models::trip::Trip {
                imei: IMEI.to_string(),
                trip_start: at(0),
                trip_finish: at(120),
                points: 3,
            }),
        ];
        let json = serde_json::to_value(TripHistory::Trips(records)).unwrap();
        assert_eq!(json[0], serde_json::json!({ "imei": IMEI }));
        assert_eq!(json[1]["trip_start"], "2012-07-23T00:00:00");
        assert_eq!(json[1]["trip_finish"], "2012-07-23T00:02:00");
        assert_eq!(json[1]["points"], 3);
    }
}
