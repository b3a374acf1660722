// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race models: registration, result, linked activity, images.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::activity::ActivityBrief;

/// Race lifecycle status as reported by the runner.
///
/// Transitions are unconstrained: the status is the runner's claim, not a
/// value derived from data, so any state is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RaceStatus {
    /// 예정 — registered, not yet run (initial state)
    #[serde(rename = "예정")]
    #[sqlx(rename = "예정")]
    Scheduled,
    /// 완주 — finished
    #[serde(rename = "완주")]
    #[sqlx(rename = "완주")]
    Finished,
    /// Did not start
    #[serde(rename = "DNS")]
    #[sqlx(rename = "DNS")]
    Dns,
    /// Did not finish
    #[serde(rename = "DNF")]
    #[sqlx(rename = "DNF")]
    Dnf,
}

impl RaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceStatus::Scheduled => "예정",
            RaceStatus::Finished => "완주",
            RaceStatus::Dns => "DNS",
            RaceStatus::Dnf => "DNF",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "예정" => Some(RaceStatus::Scheduled),
            "완주" => Some(RaceStatus::Finished),
            "DNS" => Some(RaceStatus::Dns),
            "DNF" => Some(RaceStatus::Dnf),
            _ => None,
        }
    }
}

/// Registered race distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum DistanceType {
    #[serde(rename = "full")]
    #[sqlx(rename = "full")]
    Full,
    #[serde(rename = "half")]
    #[sqlx(rename = "half")]
    Half,
    #[serde(rename = "10km")]
    #[sqlx(rename = "10km")]
    TenKm,
    #[serde(rename = "5km")]
    #[sqlx(rename = "5km")]
    FiveKm,
    /// Requires `distance_custom` in meters
    #[serde(rename = "custom")]
    #[sqlx(rename = "custom")]
    Custom,
}

/// Stored race record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Race {
    pub id: i64,
    pub user_id: i64,
    pub race_name: String,
    pub race_date: NaiveDateTime,
    pub location: Option<String>,
    pub distance_type: DistanceType,
    /// Meters; set iff distance_type is custom
    pub distance_custom: Option<f64>,
    /// Goal time in seconds
    pub target_time: Option<f64>,
    /// Finish time in seconds; values <= 0 are normalized to None on write
    pub actual_time: Option<f64>,
    pub status: RaceStatus,
    /// At most one linked activity; the activity itself knows nothing of races
    pub activity_id: Option<i64>,
    pub review: Option<String>,
}

/// Stored metadata for an uploaded race image; bytes live on disk.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RaceImage {
    pub id: i64,
    pub race_id: i64,
    /// Stored filename (uuid + extension), unique within the race directory
    #[serde(skip_serializing)]
    pub filename: String,
    pub original_name: String,
    pub uploaded_at: NaiveDateTime,
}

/// Full race projection returned by the API: race fields plus the linked
/// activity brief (when set) and image metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RaceOut {
    #[serde(flatten)]
    pub race: Race,
    pub activity: Option<ActivityBrief>,
    pub images: Vec<RaceImage>,
}
