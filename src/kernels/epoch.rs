//! This module contains the kernel for date, datetime and duration values.
//!
//! On the wire a date or datetime is a count of seconds since the start of the
//! Gregorian calendar (1582-10-14 00:00:00). A duration is a plain count of
//! seconds with no origin. Arrow counts timestamps from the Unix epoch in a
//! configurable unit, so every conversion here is an origin shift plus a scale.

use arrow_schema::TimeUnit;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Seconds between 1582-10-14 and 1970-01-01.
pub const EPOCH_OFFSET_SECONDS: f64 = 12_219_379_200.0;

/// Days between 1582-10-14 and 1970-01-01.
pub const EPOCH_OFFSET_DAYS: i64 = 141_428;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Ticks of `unit` in one second.
pub fn ticks_per_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    }
}

/// Rounds to the nearest tick, or `None` when the result does not fit an `i64`.
fn to_ticks(scaled: f64) -> Option<i64> {
    if !scaled.is_finite() {
        return None;
    }
    let r = scaled.round();
    // i64::MAX is not representable as f64; its nearest float is 2^63.
    if r < i64::MIN as f64 || r >= i64::MAX as f64 {
        None
    } else {
        Some(r as i64)
    }
}

//==================================================================================
// 1. Decode (wire seconds -> Arrow ticks)
//==================================================================================

/// `(v - offset) * scale`.
pub fn seconds_to_timestamp(seconds: f64, unit: TimeUnit) -> Option<i64> {
    to_ticks((seconds - EPOCH_OFFSET_SECONDS) * ticks_per_second(unit) as f64)
}

/// `v * scale`; durations have no origin.
pub fn seconds_to_duration(seconds: f64, unit: TimeUnit) -> Option<i64> {
    to_ticks(seconds * ticks_per_second(unit) as f64)
}

//==================================================================================
// 2. Encode (Arrow ticks -> wire seconds)
//==================================================================================

/// Whole seconds and the fractional tick remainder are converted separately,
/// so large nanosecond counts do not lose their integral part to rounding.
fn ticks_to_seconds(ticks: i64, unit: TimeUnit) -> f64 {
    let per = ticks_per_second(unit);
    let whole = ticks.div_euclid(per);
    let frac = ticks.rem_euclid(per);
    whole as f64 + frac as f64 / per as f64
}

pub fn timestamp_to_seconds(ticks: i64, unit: TimeUnit) -> f64 {
    ticks_to_seconds(ticks, unit) + EPOCH_OFFSET_SECONDS
}

pub fn duration_to_seconds(ticks: i64, unit: TimeUnit) -> f64 {
    ticks_to_seconds(ticks, unit)
}

/// Arrow `Date32` (days since 1970-01-01).
pub fn date32_to_seconds(days: i32) -> f64 {
    f64::from(days) * SECONDS_PER_DAY + EPOCH_OFFSET_SECONDS
}

//==================================================================================
// 3. Calendar helpers
//==================================================================================

/// The zero point of the wire calendar.
pub fn calendar_origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1582, 10, 14)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Converts wire seconds into a calendar date-time, at millisecond precision.
pub fn to_naive_datetime(seconds: f64) -> Option<NaiveDateTime> {
    let millis = to_ticks(seconds * 1_000.0)?;
    let delta = TimeDelta::try_milliseconds(millis)?;
    calendar_origin().checked_add_signed(delta)
}

/// Converts a calendar date-time into wire seconds.
pub fn from_naive_datetime(value: NaiveDateTime) -> f64 {
    let delta = value - calendar_origin();
    let whole = delta.num_seconds();
    let nanos = (delta - TimeDelta::seconds(whole))
        .num_nanoseconds()
        .unwrap_or(0);
    whole as f64 + nanos as f64 / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_matches_calendar() {
        let unix = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let days = (unix - calendar_origin().date()).num_days();
        assert_eq!(days, EPOCH_OFFSET_DAYS);
        assert_eq!(EPOCH_OFFSET_DAYS as f64 * SECONDS_PER_DAY, EPOCH_OFFSET_SECONDS);
    }

    #[test]
    fn test_offset_decodes_to_unix_zero() {
        for unit in [
            TimeUnit::Second,
            TimeUnit::Millisecond,
            TimeUnit::Microsecond,
            TimeUnit::Nanosecond,
        ] {
            assert_eq!(seconds_to_timestamp(EPOCH_OFFSET_SECONDS, unit), Some(0));
            assert_eq!(seconds_to_duration(0.0, unit), Some(0));
        }
        assert_eq!(timestamp_to_seconds(0, TimeUnit::Nanosecond), EPOCH_OFFSET_SECONDS);
    }

    #[test]
    fn test_durations_have_no_origin() {
        assert_eq!(seconds_to_duration(90.5, TimeUnit::Millisecond), Some(90_500));
        assert_eq!(duration_to_seconds(-1_500, TimeUnit::Millisecond), -1.5);
    }

    #[test]
    fn test_out_of_range_is_none() {
        // Around 30 million years fits seconds but not nanoseconds.
        assert_eq!(seconds_to_timestamp(1e15, TimeUnit::Nanosecond), None);
        assert!(seconds_to_timestamp(1e15, TimeUnit::Second).is_some());
        assert_eq!(seconds_to_timestamp(1e20, TimeUnit::Second), None);
        assert_eq!(seconds_to_timestamp(f64::NAN, TimeUnit::Second), None);
    }

    #[test]
    fn test_negative_timestamps_split_correctly() {
        // One and a half seconds before the Unix epoch.
        let s = timestamp_to_seconds(-1_500_000_000, TimeUnit::Nanosecond);
        assert_eq!(s, EPOCH_OFFSET_SECONDS - 1.5);
    }

    #[test]
    fn test_date32_and_calendar_round_trip() {
        assert_eq!(date32_to_seconds(1), EPOCH_OFFSET_SECONDS + 86_400.0);
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let seconds = from_naive_datetime(dt);
        assert_eq!(to_naive_datetime(seconds), Some(dt));
        assert_eq!(to_naive_datetime(0.0), Some(calendar_origin()));
    }
}
