// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregation: upcoming races, current-month running grid,
//! recent activities.
//!
//! Everything is computed from a snapshot of the store and an explicit
//! `now`, so the same inputs always produce the same payload.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Activity, RaceOut};
use crate::services::linkage::project_race;
use crate::time_utils;

/// Number of recent activities shown on the dashboard.
const RECENT_ACTIVITY_COUNT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub upcoming_races: Vec<RaceOut>,
    pub monthly_running: Vec<MonthlyRunningDay>,
    pub recent_activities: Vec<Activity>,
}

/// One calendar day of the current month. Days without a run carry a zero
/// distance and no pace so charts render a complete axis.
#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyRunningDay {
    /// `"YYYY-MM-DD"` in the display timezone
    pub date: String,
    pub distance_km: f64,
    pub avg_pace: Option<f64>,
}

#[derive(Clone)]
pub struct DashboardAggregator {
    db: Database,
}

impl DashboardAggregator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn build(
        &self,
        user_id: i64,
        now: NaiveDateTime,
        offset_hours: i32,
    ) -> Result<DashboardData> {
        let upcoming = self.db.upcoming_races(user_id, now).await?;
        let mut upcoming_races = Vec::with_capacity(upcoming.len());
        for race in upcoming {
            upcoming_races.push(project_race(&self.db, race).await?);
        }

        let monthly_running = self.monthly_running(user_id, now, offset_hours).await?;

        let recent_activities = self
            .db
            .recent_activities(user_id, RECENT_ACTIVITY_COUNT)
            .await?;

        Ok(DashboardData {
            upcoming_races,
            monthly_running,
            recent_activities,
        })
    }

    /// Daily distance/pace for every day of the current display-zone month.
    async fn monthly_running(
        &self,
        user_id: i64,
        now: NaiveDateTime,
        offset_hours: i32,
    ) -> Result<Vec<MonthlyRunningDay>> {
        let offset = time_utils::display_offset(offset_hours);
        let display_now = now.and_utc().with_timezone(&offset);
        let year = display_now.year();
        let month = display_now.month();
        let days = time_utils::days_in_month(year, month);

        // Month bounds in the display zone, translated back to the stored
        // (naive UTC) timeline for the range query
        let month_start = offset
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid month start")))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let month_end = offset
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid month end")))?;

        let activities = self
            .db
            .activities_between(user_id, month_start.naive_utc(), month_end.naive_utc())
            .await?;

        let mut daily: HashMap<String, Vec<&Activity>> = HashMap::new();
        for activity in &activities {
            daily
                .entry(time_utils::display_date_key(
                    activity.start_time,
                    offset_hours,
                ))
                .or_default()
                .push(activity);
        }

        let mut grid = Vec::with_capacity(days as usize);
        for day in 1..=days {
            let date = format!("{:04}-{:02}-{:02}", year, month, day);
            let entry = match daily.get(&date) {
                Some(day_activities) => {
                    let distance_km: f64 = day_activities
                        .iter()
                        .map(|a| a.total_distance)
                        .sum::<f64>()
                        / 1000.0;
                    let paces: Vec<f64> =
                        day_activities.iter().filter_map(|a| a.avg_pace).collect();
                    let avg_pace = if paces.is_empty() {
                        None
                    } else {
                        Some(round1(paces.iter().sum::<f64>() / paces.len() as f64))
                    };
                    MonthlyRunningDay {
                        date,
                        distance_km: round2(distance_km),
                        avg_pace,
                    }
                }
                None => MonthlyRunningDay {
                    date,
                    distance_km: 0.0,
                    avg_pace: None,
                },
            };
            grid.push(entry);
        }

        Ok(grid)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(round2(10.456), 10.46);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round1(300.04), 300.0);
        assert_eq!(round1(287.65), 287.7);
    }
}
