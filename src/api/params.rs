use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use utoipa::IntoParams;

use super::errors::AppError;

pub const DEFAULT_START: &str = "2000-01-01";
pub const DEFAULT_END: &str = "2100-01-01";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeParams {
    /// Inclusive lower bound, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS` (UTC).
    /// Defaults to `2000-01-01`.
    pub start: Option<String>,
    /// Inclusive upper bound, same formats. Defaults to `2100-01-01`.
    pub end: Option<String>,
}

impl RangeParams {
    /// Resolves both bounds to epoch seconds.
    pub fn bounds(&self) -> Result<(i64, i64), AppError> {
        let start = parse_date(self.start.as_deref().unwrap_or(DEFAULT_START))
            .ok_or_else(|| AppError::bad_request("Invalid start date"))?;
        let end = parse_date(self.end.as_deref().unwrap_or(DEFAULT_END))
            .ok_or_else(|| AppError::bad_request("Invalid end date"))?;
        Ok((start, end))
    }
}

/// Fixed layouts, `D` = ASCII digit. chrono alone would also take signed
/// years and single-digit fields.
const DATE_SHAPE: &[u8] = b"DDDD-DD-DD";
const DATE_TIME_SHAPE: &[u8] = b"DDDD-DD-DDTDD:DD:DD";

fn has_shape(raw: &str, shape: &[u8]) -> bool {
    raw.len() == shape.len()
        && raw.bytes().zip(shape).all(|(c, &s)| match s {
            b'D' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Parses a date-only string, then falls back to a date-time string, and
/// returns Unix epoch seconds. Both are taken as UTC.
pub fn parse_date(raw: &str) -> Option<i64> {
    if has_shape(raw, DATE_SHAPE) {
        return NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc().timestamp());
    }
    if has_shape(raw, DATE_TIME_SHAPE) {
        return NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
            .ok()
            .map(|dt| dt.and_utc().timestamp());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_is_midnight_utc() {
        assert_eq!(parse_date("2024-03-01"), Some(1_709_251_200));
    }

    #[test]
    fn date_and_date_time_agree_at_midnight() {
        assert_eq!(parse_date("2024-03-01"), parse_date("2024-03-01T00:00:00"));
    }

    #[test]
    fn date_time_keeps_time_of_day() {
        assert_eq!(parse_date("2024-03-01T12:30:15"), Some(1_709_251_200 + 45_015));
    }

    #[test]
    fn unrecognised_formats_rejected() {
        for raw in [
            "",
            "yesterday",
            "01/03/2024",
            "2024-13-01",
            "2024-02-30",
            "2024-03-01 00:00:00",
            "2024-03-01T00:00:00Z",
            "2024-03-01T25:00:00",
            "2024-3-1",
            "2024-03-1",
            "+2024-03-01",
            "02024-03-01",
            "2024-03-01T1:02:03",
            "2024-03-01T00:00:00.5",
            " 2024-03-01",
        ] {
            assert_eq!(parse_date(raw), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn fixed_width_fields_only() {
        assert!(has_shape("2024-03-01", DATE_SHAPE));
        assert!(!has_shape("2024-3-01", DATE_SHAPE));
        assert!(has_shape("2024-03-01T09:05:00", DATE_TIME_SHAPE));
        assert!(!has_shape("2024-03-01T09:05:00", DATE_SHAPE));
        assert!(!has_shape("２０２４-03-01", DATE_SHAPE));
    }

    #[test]
    fn defaults_cover_an_unbounded_range() {
        let (start, end) = RangeParams::default().bounds().unwrap();
        assert_eq!(start, 946_684_800);
        assert_eq!(end, 4_102_444_800);
    }

    #[test]
    fn bad_bound_names_the_parameter() {
        let params = RangeParams {
            start: Some("nope".to_owned()),
            end: None,
        };
        assert_eq!(params.bounds().unwrap_err().0.to_string(), "Invalid start date");

        let params = RangeParams {
            start: None,
            end: Some("2024-03-01T".to_owned()),
        };
        assert_eq!(params.bounds().unwrap_err().0.to_string(), "Invalid end date");
    }
}
