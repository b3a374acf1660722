// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for placing stored timestamps on calendar days.
//!
//! Activity start times are stored as naive timestamps (the UTC instant
//! parsed from the workout file, zone discarded). Everything calendar-shaped
//! (dashboard day grid, year/month filters) goes through these helpers so
//! a run recorded late in the evening lands on the runner's local day.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};

/// Build the display offset from a whole-hour UTC offset.
///
/// Out-of-range values fall back to UTC rather than failing a request.
pub fn display_offset(offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_hours.clamp(-23, 23) * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is always valid"))
}

/// Reinterpret a stored naive timestamp (a UTC instant) in the display zone.
pub fn to_display(stored: NaiveDateTime, offset_hours: i32) -> DateTime<FixedOffset> {
    stored.and_utc().with_timezone(&display_offset(offset_hours))
}

/// `"YYYY-MM-DD"` key for the display-zone calendar day of a stored timestamp.
pub fn display_date_key(stored: NaiveDateTime, offset_hours: i32) -> String {
    to_display(stored, offset_hours).format("%Y-%m-%d").to_string()
}

/// Number of days in a calendar month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_display_shift_crosses_midnight() {
        // 16:00 UTC on April 30 is already May 1 in UTC+9
        let stored = naive(2024, 4, 30, 16, 0);
        assert_eq!(display_date_key(stored, 9), "2024-05-01");
        assert_eq!(display_date_key(stored, 0), "2024-04-30");
    }

    #[test]
    fn test_negative_offset() {
        let stored = naive(2024, 5, 1, 3, 0);
        assert_eq!(display_date_key(stored, -5), "2024-04-30");
    }

    #[test]
    fn test_to_display_keeps_instant() {
        let stored = naive(2024, 5, 1, 12, 0);
        let shown = to_display(stored, 9);
        assert_eq!(shown.naive_utc(), stored);
        assert_eq!(shown.hour(), 21);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29); // leap year
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let stored = naive(2024, 5, 1, 12, 0);
        // clamped to +/-23h, never panics
        assert_eq!(to_display(stored, 99).offset().local_minus_utc(), 23 * 3600);
    }
}
