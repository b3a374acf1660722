// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pace derivation and display formatting for durations and paces.

/// Pace in seconds per kilometer, or `None` when the distance is zero.
///
/// Never returns NaN or infinity; a treadmill file with no distance simply
/// has no pace.
pub fn derive_pace(distance_meters: f64, time_seconds: f64) -> Option<f64> {
    if distance_meters > 0.0 {
        Some(time_seconds / (distance_meters / 1000.0))
    } else {
        None
    }
}

/// Render seconds as `"H:MM:SS"`, or `"M:SS"` under an hour.
pub fn format_duration(total_seconds: f64) -> String {
    let secs = total_seconds.max(0.0).round() as i64;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Render a pace in seconds/km as `"M'SS\""`.
pub fn format_pace(seconds_per_km: f64) -> String {
    let secs = seconds_per_km.max(0.0).round() as i64;
    format!("{}'{:02}\"", secs / 60, secs % 60)
}
