use crate::error::{ProcessingError, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Formats accepted for textual `datetime` cells, tried in order.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Build the calendar instant for a (year, month, day, hour) tuple.
///
/// Components arrive as numeric cells; any fractional or out-of-range
/// component yields `None`.
pub fn from_components(year: f64, month: f64, day: f64, hour: f64) -> Option<NaiveDateTime> {
    let year = integral(year)?;
    let month = u32::try_from(integral(month)?).ok()?;
    let day = u32::try_from(integral(day)?).ok()?;
    let hour = u32::try_from(integral(hour)?).ok()?;

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?.and_hms_opt(hour, 0, 0)
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse a `datetime` cell from a reference series.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")?;
    date.and_hms_opt(0, 0, 0)
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid datetime: '{}'", text)))
}

/// Render a timestamp the way output tables store it.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_components() {
        let dt = from_components(2023.0, 7.0, 15.0, 23.0).unwrap();
        assert_eq!(format_datetime(&dt), "2023-07-15 23:00:00");
    }

    #[test]
    fn test_invalid_components() {
        assert!(from_components(2023.0, 2.0, 30.0, 0.0).is_none());
        assert!(from_components(2023.0, 13.0, 1.0, 0.0).is_none());
        assert!(from_components(2023.0, 1.0, 1.0, 24.0).is_none());
        assert!(from_components(2023.0, 1.5, 1.0, 0.0).is_none());
        assert!(from_components(f64::NAN, 1.0, 1.0, 0.0).is_none());
        assert!(from_components(2023.0, -1.0, 1.0, 0.0).is_none());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = from_components(2024.0, 1.0, 2.0, 3.0).unwrap();
        assert_eq!(parse_datetime("2024-01-02 03:00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-02T03:00:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-02 03:00").unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-01-02").unwrap(),
            from_components(2024.0, 1.0, 2.0, 0.0).unwrap()
        );
        assert!(parse_datetime("02/01/2024").is_err());
    }
}
