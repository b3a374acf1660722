// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity ingestion service.
//!
//! Handles the upload workflow:
//! 1. Reject anything that is not a .tcx file before touching the bytes
//! 2. Parse lap summaries and derive totals
//! 3. Fingerprint the content and refuse duplicates
//! 4. Persist activity + laps atomically

use sha2::{Digest, Sha256};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityDetail, NewActivity, NewLap};
use crate::services::tcx::{self, ParsedActivity};

#[derive(Clone)]
pub struct ActivityIngestor {
    db: Database,
}

impl ActivityIngestor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Ingest an uploaded workout file as a new activity.
    ///
    /// Fails with `DuplicateActivity` when the user already has an activity
    /// with the same content fingerprint.
    pub async fn ingest(
        &self,
        user_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> Result<ActivityDetail> {
        let parsed = parse_first_activity(file_name, content)?;
        let fingerprint = content_fingerprint(&parsed);

        if let Some(existing) = self
            .db
            .find_activity_by_fingerprint(user_id, &fingerprint)
            .await?
        {
            return Err(duplicate_error(&existing));
        }

        let detail = self
            .db
            .create_activity(user_id, &to_new_activity(parsed, fingerprint))
            .await?;

        tracing::info!(
            user_id,
            activity_id = detail.activity.id,
            laps = detail.laps.len(),
            distance_m = detail.activity.total_distance,
            duration = %crate::metrics::format_duration(detail.activity.total_time),
            pace = ?detail.activity.avg_pace.map(crate::metrics::format_pace),
            "Activity ingested"
        );

        Ok(detail)
    }

    /// Ingest for race linking: an upload whose fingerprint matches an
    /// existing activity reuses that activity instead of failing.
    ///
    /// Returns the activity and whether it was newly created.
    pub async fn ingest_or_reuse(
        &self,
        user_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> Result<(Activity, bool)> {
        let parsed = parse_first_activity(file_name, content)?;
        let fingerprint = content_fingerprint(&parsed);

        if let Some(existing) = self
            .db
            .find_activity_by_fingerprint(user_id, &fingerprint)
            .await?
        {
            return Ok((existing, false));
        }

        match self
            .db
            .create_activity(user_id, &to_new_activity(parsed, fingerprint.clone()))
            .await
        {
            Ok(detail) => Ok((detail.activity, true)),
            // Lost a concurrent-upload race on the fingerprint index; the
            // other writer's activity is the one to link
            Err(AppError::DuplicateActivity(_)) => {
                let existing = self
                    .db
                    .find_activity_by_fingerprint(user_id, &fingerprint)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database("Duplicate fingerprint vanished".to_string())
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }
}

/// Validate the extension and parse the first activity in the file.
fn parse_first_activity(file_name: &str, content: &[u8]) -> Result<ParsedActivity> {
    validate_extension(file_name)?;
    tcx::parse_tcx(content)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::MalformedFile("No activity data in file".to_string()))
}

/// Case-insensitive `.tcx` check, before any parsing is attempted.
fn validate_extension(file_name: &str) -> Result<()> {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str());
    match ext {
        Some(e) if e.eq_ignore_ascii_case("tcx") => Ok(()),
        _ => Err(AppError::InvalidFileType),
    }
}

/// Content fingerprint for duplicate detection: start time + total
/// distance + total time, hashed. Deliberately not a byte hash, so the
/// same workout exported twice (differing only in XML formatting or
/// trackpoint precision) still counts as a duplicate.
fn content_fingerprint(parsed: &ParsedActivity) -> String {
    let seed = format!(
        "{}|{:.1}|{:.1}",
        parsed.start_time.and_utc().to_rfc3339(),
        parsed.total_distance,
        parsed.total_time
    );
    hex::encode(Sha256::digest(seed.as_bytes()))
}

fn duplicate_error(existing: &Activity) -> AppError {
    AppError::DuplicateActivity(format!(
        "This workout was already uploaded: {} / {:.1} km",
        existing.start_time.format("%Y-%m-%d %H:%M"),
        existing.total_distance / 1000.0
    ))
}

fn to_new_activity(parsed: ParsedActivity, fingerprint: String) -> NewActivity {
    NewActivity {
        start_time: parsed.start_time,
        total_distance: parsed.total_distance,
        total_time: parsed.total_time,
        avg_pace: parsed.avg_pace,
        avg_hr: parsed.avg_hr,
        avg_cadence: parsed.avg_cadence,
        fingerprint,
        laps: parsed
            .laps
            .into_iter()
            .map(|lap| NewLap {
                lap_number: lap.lap_number,
                distance: lap.distance,
                time: lap.time,
                pace: lap.pace,
                avg_hr: lap.avg_hr,
                max_hr: lap.max_hr,
                avg_cadence: lap.avg_cadence,
            })
            .collect(),
    }
}
