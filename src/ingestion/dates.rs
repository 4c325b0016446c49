//! OLE Automation serial dates.
//!
//! A serial is a day count relative to 1899-12-30; the fractional part is the time of day.
//! For negative serials the fraction still counts forward from midnight, so `-1.25` is
//! 1899-12-29 06:00.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{IngestionError, IngestionResult};

const MILLIS_PER_DAY: i64 = 86_400_000;

// Serials outside this open interval fall before year 100 or after year 9999.
const MIN_SERIAL: f64 = -657_435.0;
const MAX_SERIAL: f64 = 2_958_466.0;

/// Midnight of 1899-12-30, day zero of the serial encoding.
pub fn ole_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Value stored when a date cell is not a usable serial: 1900-01-01 00:00.
pub fn fallback_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a serial to a date-time, rounding to the nearest millisecond.
///
/// Returns `None` for non-finite serials and serials outside years 100..=9999.
pub fn from_ole_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial <= MIN_SERIAL || serial >= MAX_SERIAL {
        return None;
    }

    let half = if serial >= 0.0 { 0.5 } else { -0.5 };
    // Bounded by the range check above, well inside i64.
    let mut millis = (serial * MILLIS_PER_DAY as f64 + half) as i64;
    if millis < 0 {
        millis -= (millis % MILLIS_PER_DAY) * 2;
    }

    ole_epoch().checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Parse cell text as a serial and convert it, falling back to [`fallback_date`].
pub fn parse_ole_text(text: Option<&str>) -> NaiveDateTime {
    text.and_then(|t| t.trim().parse::<f64>().ok())
        .and_then(from_ole_serial)
        .unwrap_or_else(fallback_date)
}

/// Render `value` with a strftime pattern.
///
/// Fails for patterns chrono cannot parse and for fields a naive date-time does not carry
/// (`%z`, `%Z`, `%+`).
pub fn format_date(value: NaiveDateTime, format: &str) -> IngestionResult<String> {
    let mut out = String::new();
    write!(out, "{}", value.format(format)).map_err(|_| IngestionError::InvalidConfig {
        message: format!("invalid date format '{format}'"),
    })?;
    Ok(out)
}

/// Whether `format` renders a naive date-time without error.
pub fn is_valid_format(format: &str) -> bool {
    format_date(ole_epoch(), format).is_ok()
}

#[cfg(test)]
mod tests {
    use super::{fallback_date, format_date, from_ole_serial, is_valid_format, parse_ole_text};
    use crate::error::IngestionError;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn serial_one_is_last_day_of_1899() {
        assert_eq!(from_ole_serial(1.0), Some(dt(1899, 12, 31, 0, 0, 0)));
        assert_eq!(from_ole_serial(0.0), Some(dt(1899, 12, 30, 0, 0, 0)));
    }

    #[test]
    fn fractional_serial_carries_time_of_day() {
        assert_eq!(from_ole_serial(45_000.5), Some(dt(2023, 3, 15, 12, 0, 0)));
        assert_eq!(from_ole_serial(2.25), Some(dt(1900, 1, 1, 6, 0, 0)));
    }

    #[test]
    fn negative_serial_counts_fraction_forward() {
        assert_eq!(from_ole_serial(-1.25), Some(dt(1899, 12, 29, 6, 0, 0)));
    }

    #[test]
    fn out_of_range_and_non_finite_serials_are_rejected() {
        assert_eq!(from_ole_serial(f64::NAN), None);
        assert_eq!(from_ole_serial(f64::INFINITY), None);
        assert_eq!(from_ole_serial(3_000_000.0), None);
        assert_eq!(from_ole_serial(-700_000.0), None);
    }

    #[test]
    fn unparseable_text_falls_back() {
        assert_eq!(parse_ole_text(Some("amanhã")), fallback_date());
        assert_eq!(parse_ole_text(None), fallback_date());
        assert_eq!(parse_ole_text(Some(" 1 ")), dt(1899, 12, 31, 0, 0, 0));
    }

    #[test]
    fn format_validation() {
        assert!(is_valid_format("%d/%m/%Y %H:%M:%S"));
        assert!(!is_valid_format("%Q"));
    }

    #[test]
    fn offset_fields_cannot_render_naive_dates() {
        for fmt in ["%z", "%:z", "%Z", "%+", "%d/%m/%Y %z"] {
            assert!(!is_valid_format(fmt), "{fmt} should be rejected");
        }
        let err = format_date(fallback_date(), "%d/%m/%Y %z").unwrap_err();
        assert!(matches!(err, IngestionError::InvalidConfig { .. }));
        assert_eq!(format_date(fallback_date(), "%Y-%m-%d").unwrap(), "1900-01-01");
    }
}
