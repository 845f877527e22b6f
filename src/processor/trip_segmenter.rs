use chrono::Duration;

use crate::models::position::PositionHistoryEntry;
use crate::models::trip::Trip;

pub const DEFAULT_TRIP_GAP_SECONDS: i64 = 3600;

/// Splits a device's position history into trips wherever two consecutive
/// samples are more than `max_gap` apart.
#[derive(Debug, Clone, Copy)]
pub struct TripSegmenter {
    max_gap: Duration,
}

impl Default for TripSegmenter {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TRIP_GAP_SECONDS))
    }
}

impl TripSegmenter {
    pub fn new(max_gap: Duration) -> Self {
        Self { max_gap }
    }

    /// `history` must belong to one device and is expected in `created`
    /// order. Unordered input still yields trips with `trip_start <=
    /// trip_finish`, but boundaries may be off.
    pub fn segment(&self, history: &[PositionHistoryEntry]) -> Vec<Trip> {
        let Some(first) = history.first() else {
            return Vec::new();
        };

        let mut trips = Vec::new();
        let mut start = first.created;
        let mut finish = first.created;
        let mut points: u32 = 0;
        let mut previous: Option<&PositionHistoryEntry> = None;

        for entry in history {
            if let Some(prev) = previous {
                if entry.created - prev.created > self.max_gap {
                    trips.push(Trip {
                        imei: first.imei.clone(),
                        trip_start: start,
                        trip_finish: finish,
                        points,
                    });
                    start = entry.created;
                    finish = entry.created;
                    points = 0;
                }
            }

            points += 1;
            finish = finish.max(entry.created);
            previous = Some(entry);
        }

        trips.push(Trip {
            imei: first.imei.clone(),
            trip_start: start,
            trip_finish: finish,
            points,
        });
        trips
    }
}
