//! Events produced by the tracker protocol decoder.

const MAX_IMEI_LEN: usize = 32;

/// Device identifiers are 1 to 32 ASCII alphanumerics. Applied both when
/// decoding and when querying, so every stored device stays addressable.
pub fn is_valid_imei(imei: &str) -> bool {
    !imei.is_empty() && imei.len() <= MAX_IMEI_LEN && imei.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Keepalive or acknowledgement record carrying no position.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub imei: String,
    pub code: String,
}

/// One decoded `tracker` record.
///
/// Coordinates are signed decimal degrees, speed is km/h and bearing is
/// normalized into `[0, 360)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub imei: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub bearing_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Status(StatusEvent),
    Position(PositionReport),
    /// A record that looked like tracker traffic but had an unusable shape.
    Ignored { record: String, reason: &'static str },
}
