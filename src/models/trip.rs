use chrono::NaiveDateTime;
use serde::Serialize;

/// Contiguous run of history samples without a gap above the trip threshold.
/// Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub imei: String,
    pub trip_start: NaiveDateTime,
    pub trip_finish: NaiveDateTime,
    pub points: u32,
}

/// Element of the `/trip/{imei}` response: a device marker followed by trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TripRecord {
    Device { imei: String },
    Trip(Trip),
}
