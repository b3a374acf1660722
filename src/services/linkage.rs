// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race service: registration, edits, results, and the race↔activity link.
//!
//! A race references at most one activity by id and never copies its data.
//! Linking never deletes activities: replacing a link simply orphans the
//! old activity back into the plain activity list. Nothing prevents one
//! activity from backing two races (relay + overall entry is a real case).

use chrono::NaiveDateTime;

use crate::db::{Database, NewRace};
use crate::error::{AppError, Result};
use crate::models::{ActivityBrief, DistanceType, Race, RaceImage, RaceOut, RaceStatus};
use crate::services::ingest::ActivityIngestor;

/// Partial edit of registration fields (PUT /races/{id}).
/// Outer `None` = field untouched; inner `None` = cleared.
#[derive(Debug, Default, Clone)]
pub struct RaceEdit {
    pub race_name: Option<String>,
    pub race_date: Option<NaiveDateTime>,
    pub location: Option<Option<String>>,
    pub distance_type: Option<DistanceType>,
    pub distance_custom: Option<Option<f64>>,
    pub target_time: Option<Option<f64>>,
}

/// Combined result mutation (PUT /races/{id}/result).
/// Status is always required; the rest follow RaceEdit's two-level rule.
#[derive(Debug, Clone)]
pub struct RaceResultPatch {
    pub status: RaceStatus,
    pub actual_time: Option<Option<f64>>,
    pub activity_id: Option<Option<i64>>,
    pub review: Option<Option<String>>,
}

#[derive(Clone)]
pub struct RaceLinkageManager {
    db: Database,
    ingestor: ActivityIngestor,
}

impl RaceLinkageManager {
    pub fn new(db: Database, ingestor: ActivityIngestor) -> Self {
        Self { db, ingestor }
    }

    /// Register a race. Status starts as scheduled.
    pub async fn create(&self, user_id: i64, mut new: NewRace) -> Result<Race> {
        validate_distance(new.distance_type, new.distance_custom)?;
        if new.distance_type != DistanceType::Custom {
            new.distance_custom = None;
        }
        let race = self.db.create_race(user_id, &new).await?;
        tracing::info!(user_id, race_id = race.id, name = %race.race_name, "Race registered");
        Ok(race)
    }

    /// Apply a partial edit to registration fields.
    pub async fn update(&self, user_id: i64, race_id: i64, edit: RaceEdit) -> Result<Race> {
        let mut race = self.get(user_id, race_id).await?;

        if let Some(name) = edit.race_name {
            race.race_name = name;
        }
        if let Some(date) = edit.race_date {
            race.race_date = date;
        }
        if let Some(location) = edit.location {
            race.location = location;
        }
        if let Some(distance_type) = edit.distance_type {
            race.distance_type = distance_type;
        }
        if let Some(distance_custom) = edit.distance_custom {
            race.distance_custom = distance_custom;
        }
        if let Some(target_time) = edit.target_time {
            race.target_time = normalize_time(target_time);
        }

        validate_distance(race.distance_type, race.distance_custom)?;
        if race.distance_type != DistanceType::Custom {
            race.distance_custom = None;
        }

        self.db.update_race(&race).await?;
        Ok(race)
    }

    /// Record a result: status plus optional time, link, and review.
    ///
    /// Status transitions are unconstrained — the status is whatever the
    /// runner reports. An `actual_time` of zero or less means "unset".
    pub async fn update_result(
        &self,
        user_id: i64,
        race_id: i64,
        patch: RaceResultPatch,
    ) -> Result<Race> {
        let mut race = self.get(user_id, race_id).await?;

        race.status = patch.status;
        if let Some(actual_time) = patch.actual_time {
            race.actual_time = normalize_time(actual_time);
        }
        if let Some(review) = patch.review {
            race.review = review;
        }
        if let Some(activity_id) = patch.activity_id {
            race.activity_id = match activity_id {
                Some(id) => Some(self.owned_activity_id(user_id, id).await?),
                None => None,
            };
        }

        self.db.update_race(&race).await?;
        tracing::info!(
            user_id,
            race_id,
            status = race.status.as_str(),
            activity_id = ?race.activity_id,
            "Race result updated"
        );
        Ok(race)
    }

    /// Attach an uploaded TCX to a race.
    ///
    /// Creates the activity (or reuses an identical existing one) and sets
    /// the link. Uploading the file already linked to this race is a no-op;
    /// replacing a different link drops it without deleting the old activity.
    pub async fn link_by_upload(
        &self,
        user_id: i64,
        race_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> Result<Race> {
        let mut race = self.get(user_id, race_id).await?;

        let (activity, created) = self
            .ingestor
            .ingest_or_reuse(user_id, file_name, content)
            .await?;

        if race.activity_id == Some(activity.id) {
            tracing::debug!(race_id, activity_id = activity.id, "Race already linked");
            return Ok(race);
        }

        let replaced = race.activity_id;
        race.activity_id = Some(activity.id);
        self.db.update_race(&race).await?;

        tracing::info!(
            user_id,
            race_id,
            activity_id = activity.id,
            created,
            replaced = ?replaced,
            "Race linked to activity"
        );
        Ok(race)
    }

    /// Set or clear the link directly by activity id.
    pub async fn link_by_reference(
        &self,
        user_id: i64,
        race_id: i64,
        activity_id: Option<i64>,
    ) -> Result<Race> {
        let mut race = self.get(user_id, race_id).await?;
        race.activity_id = match activity_id {
            Some(id) => Some(self.owned_activity_id(user_id, id).await?),
            None => None,
        };
        self.db.update_race(&race).await?;
        Ok(race)
    }

    /// Delete a race, returning its image metadata so the caller can remove
    /// the files. The linked activity survives.
    pub async fn delete(&self, user_id: i64, race_id: i64) -> Result<Vec<RaceImage>> {
        let race = self.get(user_id, race_id).await?;
        let images = self.db.list_race_images(race.id).await?;
        self.db.delete_race(user_id, race.id).await?;
        tracing::info!(user_id, race_id, "Race deleted");
        Ok(images)
    }

    pub async fn get(&self, user_id: i64, race_id: i64) -> Result<Race> {
        self.db
            .get_race(user_id, race_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Race not found".to_string()))
    }

    /// Full API projection: race + linked-activity brief + images.
    pub async fn project(&self, race: Race) -> Result<RaceOut> {
        project_race(&self.db, race).await
    }

    /// Validate that an activity exists and belongs to the user.
    async fn owned_activity_id(&self, user_id: i64, activity_id: i64) -> Result<i64> {
        let activity = self
            .db
            .get_activity_any(activity_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Activity not found".to_string()))?;
        if activity.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(activity.id)
    }
}

/// Assemble the race projection. Shared with the dashboard, which embeds
/// upcoming races in the same shape.
pub async fn project_race(db: &Database, race: Race) -> Result<RaceOut> {
    let activity = match race.activity_id {
        Some(activity_id) => db
            .get_activity(race.user_id, activity_id)
            .await?
            .as_ref()
            .map(ActivityBrief::from),
        None => None,
    };
    let images = db.list_race_images(race.id).await?;
    Ok(RaceOut {
        race,
        activity,
        images,
    })
}

fn validate_distance(distance_type: DistanceType, distance_custom: Option<f64>) -> Result<()> {
    if distance_type == DistanceType::Custom {
        match distance_custom {
            Some(d) if d > 0.0 => Ok(()),
            _ => Err(AppError::Validation(
                "distance_custom (meters) is required for a custom distance".to_string(),
            )),
        }
    } else {
        Ok(())
    }
}

/// Times of zero or less are "unset", never stored as zero.
fn normalize_time(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}
