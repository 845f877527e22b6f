//! Decoder for the TK103-style text protocol.
//!
//! A read from a tracker socket may hold any number of `;`-terminated
//! records, e.g.
//!
//! ```text
//! ##,imei:012497000326409,A;imei:012497000326409,tracker,1207231727,0031645890190,F,092716.000,A,5221.7102,N,00457.7187,E,0.00,,;
//! ```
//!
//! Keepalives carry a `##,` prefix and a single status code. Tracking
//! records carry the fix in the field order below. Anything else is
//! dropped without failing the rest of the chunk.

use crate::models::message::{is_valid_imei, PositionReport, StatusEvent, TrackerEvent};

use super::coordinates::{apply_hemisphere, to_decimal_degrees};

const IMEI_MARKER: &str = "imei";
const IMEI_PREFIX: &str = "imei:";
const RECORD_SEPARATOR: char = ';';
const KEEPALIVE_PREFIX: &str = "##,";
const TRACKER_MARKER: &str = "tracker";
const KNOTS_TO_KMH: f64 = 1.852;

// Field positions in a tracking record.
const LATITUDE: usize = 7;
const LATITUDE_HEMISPHERE: usize = 8;
const LONGITUDE: usize = 9;
const LONGITUDE_HEMISPHERE: usize = 10;
const SPEED_KNOTS: usize = 11;
const BEARING: usize = 12;

/// Decodes one chunk of tracker traffic into events, in record order.
///
/// Chunks without any IMEI marker or record separator are not tracker
/// traffic and yield nothing.
pub fn decode(chunk: &str) -> Vec<TrackerEvent> {
    if !chunk.contains(IMEI_MARKER) || !chunk.contains(RECORD_SEPARATOR) {
        return Vec::new();
    }

    let mut records: Vec<&str> = chunk.split(RECORD_SEPARATOR).collect();
    if records.last().is_some_and(|r| r.trim().is_empty()) {
        records.pop();
    }

    records.into_iter().filter_map(decode_record).collect()
}

fn decode_record(record: &str) -> Option<TrackerEvent> {
    let record = record.trim();
    let body = record.strip_prefix(KEEPALIVE_PREFIX).unwrap_or(record);
    let fields: Vec<&str> = body.split(',').map(str::trim).collect();

    if fields.len() < 2 {
        return None;
    }

    let imei = match fields[0].strip_prefix(IMEI_PREFIX) {
        Some(id) if !id.is_empty() => id,
        _ => return Some(ignored(record, "missing imei field")),
    };
    if !is_valid_imei(imei) {
        return Some(ignored(record, "invalid imei"));
    }

    if fields.len() == 2 {
        let code = if fields[1] == "A" { "OK" } else { fields[1] };
        return Some(TrackerEvent::Status(StatusEvent {
            imei: imei.to_string(),
            code: code.to_string(),
        }));
    }

    if fields[1] != TRACKER_MARKER {
        return Some(ignored(record, "unknown record type"));
    }

    match decode_tracker(imei, &fields) {
        Ok(report) => Some(TrackerEvent::Position(report)),
        Err(reason) => Some(ignored(record, reason)),
    }
}

//       0            1        2          3         4     5      6     7     8     9     10  11    12
// imei:<id>,tracker,<date>,<admin phone>,F,<time>,A,<lat>,N|S,<lon>,E|W,<knots>,<bearing>,
fn decode_tracker(imei: &str, fields: &[&str]) -> Result<PositionReport, &'static str> {
    if fields.len() <= BEARING {
        return Err("tracking record too short");
    }

    let raw_lat = parse_finite(fields[LATITUDE]).ok_or("invalid latitude")?;
    let latitude = apply_hemisphere(
        to_decimal_degrees(raw_lat),
        fields[LATITUDE_HEMISPHERE],
        "N",
        "S",
    )
    .ok_or("invalid latitude hemisphere")?;

    let raw_lon = parse_finite(fields[LONGITUDE]).ok_or("invalid longitude")?;
    let longitude = apply_hemisphere(
        to_decimal_degrees(raw_lon),
        fields[LONGITUDE_HEMISPHERE],
        "E",
        "W",
    )
    .ok_or("invalid longitude hemisphere")?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err("coordinates out of range");
    }

    let knots = parse_finite(fields[SPEED_KNOTS])
        .filter(|k| *k >= 0.0)
        .ok_or("invalid speed")?
        .abs();

    let bearing_deg = if fields[BEARING].is_empty() {
        0.0
    } else {
        parse_finite(fields[BEARING])
            .ok_or("invalid bearing")?
            .rem_euclid(360.0)
    };

    Ok(PositionReport {
        imei: imei.to_string(),
        latitude,
        longitude,
        speed_kmh: knots * KNOTS_TO_KMH,
        bearing_deg,
    })
}

fn parse_finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn ignored(record: &str, reason: &'static str) -> TrackerEvent {
    TrackerEvent::Ignored {
        record: record.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACKING: &str = "imei:012497000326409,tracker,1207231727,0031645890190,F,092716.000,A,5221.7102,N,00457.7187,E,0.00,,";

    fn positions(events: &[TrackerEvent]) -> Vec<&PositionReport> {
        events
            .iter()
            .filter_map(|e| match e {
                TrackerEvent::Position(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_keepalive_is_ok_status() {
        let events = decode("##,imei:012497000326409,A;");
        assert_eq!(
            events,
            vec![TrackerEvent::Status(StatusEvent {
                imei: "012497000326409".to_string(),
                code: "OK".to_string(),
            })]
        );
    }

    #[test]
    fn test_other_status_code_is_passed_through() {
        let events = decode("##,imei:012497000326409,help me;");
        match &events[..] {
            [TrackerEvent::Status(s)] => assert_eq!(s.code, "help me"),
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_tracking_record() {
        let events = decode(&format!("{};", TRACKING));
        assert_eq!(events.len(), 1);
        let report = positions(&events)[0];
        assert_eq!(report.imei, "012497000326409");
        assert!((report.latitude - 52.36184).abs() < 1e-5);
        assert!((report.longitude - 4.96198).abs() < 1e-5);
        assert_eq!(report.speed_kmh, 0.0);
        assert_eq!(report.bearing_deg, 0.0);
    }

    #[test]
    fn test_tracking_record_with_speed_and_bearing() {
        let events = decode("imei:012497000326409,tracker,1207222134,0031645890190,F,133455.000,A,5222.0177,N,00454.4011,E,4.16,218.50,;");
        let report = positions(&events)[0];
        assert!((report.speed_kmh - 4.16 * 1.852).abs() < 1e-9);
        assert_eq!(report.bearing_deg, 218.5);
    }

    #[test]
    fn test_southern_and_western_hemispheres_are_negative() {
        let events = decode("imei:1,tracker,1207231727,0031645890190,F,092716.000,A,3352.1000,S,15112.6000,W,1.00,90,;");
        let report = positions(&events)[0];
        assert!((report.latitude + 33.868333).abs() < 1e-5);
        assert!((report.longitude + 151.21).abs() < 1e-5);
    }

    #[test]
    fn test_keepalives_around_tracking_record() {
        let chunk = format!(
            "##,imei:012497000326409,A;##,imei:012497000326409,A;{};##,imei:012497000326409,A;",
            TRACKING
        );
        let events = decode(&chunk);
        assert_eq!(events.len(), 4);
        assert_eq!(positions(&events).len(), 1);
        assert!(matches!(events[2], TrackerEvent::Position(_)));
    }

    #[test]
    fn test_whitespace_between_records() {
        let chunk = format!("##,imei:012497000326409,A; {};\r\n", TRACKING);
        let events = decode(&chunk);
        assert_eq!(events.len(), 2);
        assert_eq!(positions(&events).len(), 1);
    }

    #[test]
    fn test_only_keepalives_yield_no_positions() {
        let events = decode("##,imei:012497000326409,A;##,imei:012497000326409,A;");
        assert_eq!(events.len(), 2);
        assert!(positions(&events).is_empty());
    }

    #[test]
    fn test_unrecognized_traffic_yields_nothing() {
        assert!(decode("").is_empty());
        assert!(decode("GET / HTTP/1.1\r\n").is_empty());
        assert!(decode("##,imei:012497000326409,A").is_empty());
        assert!(decode("foo;bar;").is_empty());
    }

    #[test]
    fn test_malformed_records_do_not_stop_decoding() {
        let chunk = format!(
            "imei:1,tracker,1207;imei:2;garbage,x,y;imei:3,tracker,1,2,F,3,A,abc,N,00457.7187,E,0.00,,;{};",
            TRACKING
        );
        let events = decode(&chunk);
        // `imei:2` has a single field and is dropped without an event
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], TrackerEvent::Ignored { reason: "tracking record too short", .. }));
        assert!(matches!(events[1], TrackerEvent::Ignored { reason: "missing imei field", .. }));
        assert!(matches!(events[2], TrackerEvent::Ignored { reason: "invalid latitude", .. }));
        assert!(matches!(events[3], TrackerEvent::Position(_)));
    }

    #[test]
    fn test_unknown_hemisphere_is_ignored() {
        let events = decode("imei:1,tracker,1207231727,0,F,092716.000,A,5221.7102,Q,00457.7187,E,0.00,,;");
        assert!(matches!(
            &events[..],
            [TrackerEvent::Ignored { reason: "invalid latitude hemisphere", .. }]
        ));
    }

    #[test]
    fn test_imei_outside_device_id_rule_is_ignored() {
        let events = decode("##,imei:0124 97,A;imei:0124-97000326409,tracker,1207231727,0,F,092716.000,A,5221.7102,N,00457.7187,E,1.00,,;");
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, TrackerEvent::Ignored { reason: "invalid imei", .. })));
    }

    #[test]
    fn test_negative_zero_speed_is_stored_as_zero() {
        let events = decode("imei:1,tracker,1207231727,0,F,092716.000,A,5221.7102,N,00457.7187,E,-0.00,,;");
        let report = positions(&events)[0];
        assert_eq!(report.speed_kmh, 0.0);
        assert!(report.speed_kmh.is_sign_positive());
    }
}
