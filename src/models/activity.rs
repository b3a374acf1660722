// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity and lap models for storage and API.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Stored activity record: one uploaded workout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    /// Session start, stored without an explicit zone (UTC instant from the file)
    pub start_time: NaiveDateTime,
    /// Meters
    pub total_distance: f64,
    /// Seconds
    pub total_time: f64,
    /// Seconds per km; None when total_distance is zero
    pub avg_pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub avg_cadence: Option<f64>,
    /// Content fingerprint used for duplicate detection; not part of the API
    #[serde(skip_serializing)]
    pub fingerprint: String,
}

/// Stored lap record, an immutable snapshot taken at ingestion time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Lap {
    pub id: i64,
    pub activity_id: i64,
    /// 1-based, contiguous within an activity
    pub lap_number: i64,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub time: f64,
    /// Seconds per km; None when distance is zero
    pub pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub avg_cadence: Option<f64>,
}

/// Activity plus its ordered laps, as returned by detail endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub activity: Activity,
    pub laps: Vec<Lap>,
}

/// Compact projection embedded in race responses.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityBrief {
    pub id: i64,
    pub start_time: NaiveDateTime,
    pub total_distance: f64,
    pub total_time: f64,
    pub avg_pace: Option<f64>,
}

impl From<&Activity> for ActivityBrief {
    fn from(a: &Activity) -> Self {
        Self {
            id: a.id,
            start_time: a.start_time,
            total_distance: a.total_distance,
            total_time: a.total_time,
            avg_pace: a.avg_pace,
        }
    }
}

/// A fully-derived activity ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub start_time: NaiveDateTime,
    pub total_distance: f64,
    pub total_time: f64,
    pub avg_pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub fingerprint: String,
    pub laps: Vec<NewLap>,
}

#[derive(Debug, Clone)]
pub struct NewLap {
    pub lap_number: i64,
    pub distance: f64,
    pub time: f64,
    pub pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub avg_cadence: Option<f64>,
}
