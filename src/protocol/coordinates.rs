//! Sensor coordinate encoding.

/// Converts the sensor's `DDMM.MMMM` encoding (degrees followed by decimal
/// minutes) to decimal degrees. `5221.7102` is 52°21.7102'.
pub fn to_decimal_degrees(raw: f64) -> f64 {
    let v = raw / 100.0;
    let degrees = v.trunc();
    degrees + (v - degrees) * (100.0 / 60.0)
}

/// Applies the hemisphere sign to an already converted coordinate.
/// `positive` and `negative` are the hemisphere letters, e.g. `N`/`S`.
pub fn apply_hemisphere(value: f64, hemisphere: &str, positive: &str, negative: &str) -> Option<f64> {
    match hemisphere.trim() {
        h if h == positive => Some(value),
        h if h == negative => Some(-value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_conversion() {
        let lat = to_decimal_degrees(5221.7102);
        assert!((lat - 52.361836).abs() < 1e-6, "got {}", lat);
    }

    #[test]
    fn test_longitude_with_leading_zeroes() {
        let raw: f64 = "00457.7187".parse().unwrap();
        let lon = to_decimal_degrees(raw);
        assert!((lon - 4.961978).abs() < 1e-6, "got {}", lon);
    }

    #[test]
    fn test_whole_degrees_are_truncated_not_rounded() {
        // 59.99 minutes must stay below the next degree
        let v = to_decimal_degrees(1259.99);
        assert!(v > 12.99 && v < 13.0, "got {}", v);
    }

    #[test]
    fn test_hemisphere_sign() {
        assert_eq!(apply_hemisphere(52.5, "N", "N", "S"), Some(52.5));
        assert_eq!(apply_hemisphere(52.5, "S", "N", "S"), Some(-52.5));
        assert_eq!(apply_hemisphere(4.9, "W", "E", "W"), Some(-4.9));
        assert_eq!(apply_hemisphere(4.9, "X", "E", "W"), None);
    }
}
