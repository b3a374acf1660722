// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity filter index: which years have activities, and which months
//! within a year, to drive the list view's filter selectors.
//!
//! Pure functions over display-normalized start times. The rule that
//! picking a new year resets a previously selected month belongs to the
//! consumer; these functions only report what exists.

use chrono::Datelike;

use crate::models::Activity;
use crate::time_utils;

/// Distinct calendar years with at least one activity, most recent first.
pub fn years(activities: &[Activity], offset_hours: i32) -> Vec<i32> {
    let mut years: Vec<i32> = activities
        .iter()
        .map(|a| time_utils::to_display(a.start_time, offset_hours).year())
        .collect();
    years.sort_unstable();
    years.dedup();
    years.reverse();
    years
}

/// Distinct months (1–12) with at least one activity, most recent first.
/// `year = None` spans all years.
pub fn months(activities: &[Activity], year: Option<i32>, offset_hours: i32) -> Vec<u32> {
    let mut months: Vec<u32> = activities
        .iter()
        .filter_map(|a| {
            let shown = time_utils::to_display(a.start_time, offset_hours);
            match year {
                Some(y) if shown.year() != y => None,
                _ => Some(shown.month()),
            }
        })
        .collect();
    months.sort_unstable();
    months.dedup();
    months.reverse();
    months
}
