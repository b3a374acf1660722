// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (registration and lookup)
//! - Activities and laps (created atomically at ingestion)
//! - Races (registration, results, activity link)
//! - Race images (metadata; bytes live on the filesystem)
//!
//! Two operations are transactional by contract: activity creation (an
//! aborted ingest must leave no partial activity or laps visible) and
//! activity deletion (which clears any race link in the same transaction,
//! so a race never holds a dangling `activity_id`).

use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{
    Activity, ActivityDetail, DistanceType, Lap, NewActivity, Race, RaceImage, RaceStatus, User,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS activities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    start_time TEXT NOT NULL,
    total_distance REAL NOT NULL,
    total_time REAL NOT NULL,
    avg_pace REAL,
    avg_hr REAL,
    avg_cadence REAL,
    fingerprint TEXT NOT NULL,
    UNIQUE(user_id, fingerprint)
);
CREATE TABLE IF NOT EXISTS laps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    activity_id INTEGER NOT NULL REFERENCES activities(id),
    lap_number INTEGER NOT NULL,
    distance REAL NOT NULL,
    time REAL NOT NULL,
    pace REAL,
    avg_hr REAL,
    max_hr REAL,
    avg_cadence REAL,
    UNIQUE(activity_id, lap_number)
);
CREATE TABLE IF NOT EXISTS races (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    race_name TEXT NOT NULL,
    race_date TEXT NOT NULL,
    location TEXT,
    distance_type TEXT NOT NULL,
    distance_custom REAL,
    target_time REAL,
    actual_time REAL,
    status TEXT NOT NULL,
    activity_id INTEGER REFERENCES activities(id),
    review TEXT
);
CREATE TABLE IF NOT EXISTS race_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    race_id INTEGER NOT NULL REFERENCES races(id),
    filename TEXT NOT NULL,
    original_name TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activities_user_start ON activities(user_id, start_time);
CREATE INDEX IF NOT EXISTS idx_races_user_date ON races(user_id, race_date);
CREATE INDEX IF NOT EXISTS idx_races_activity ON races(activity_id);
"#;

/// Fields of a race that are set at registration time.
#[derive(Debug, Clone)]
pub struct NewRace {
    pub race_name: String,
    pub race_date: NaiveDateTime,
    pub location: Option<String>,
    pub distance_type: DistanceType,
    pub distance_custom: Option<f64>,
    pub target_time: Option<f64>,
}

/// SQLite database handle, cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database and bootstrap the schema.
    ///
    /// In-memory databases get a single persistent connection, since every
    /// pooled connection to `:memory:` would otherwise see its own empty
    /// database.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Schema bootstrap failed: {}", e)))?;

        tracing::info!(url = database_url, "Database ready");

        Ok(Self { pool })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Register a user. The email must be unique.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        now: NaiveDateTime,
    ) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Validation(
                    "This email is already registered".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        })
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Insert an activity and all of its laps in one transaction.
    ///
    /// A concurrent upload of the same content loses on the
    /// `(user_id, fingerprint)` unique index and surfaces as
    /// `DuplicateActivity` rather than a second row.
    pub async fn create_activity(
        &self,
        user_id: i64,
        new: &NewActivity,
    ) -> Result<ActivityDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO activities \
             (user_id, start_time, total_distance, total_time, avg_pace, avg_hr, avg_cadence, fingerprint) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(new.start_time)
        .bind(new.total_distance)
        .bind(new.total_time)
        .bind(new.avg_pace)
        .bind(new.avg_hr)
        .bind(new.avg_cadence)
        .bind(&new.fingerprint)
        .execute(&mut *tx)
        .await;

        let result = match result {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::DuplicateActivity(
                    "An identical workout already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        let activity_id = result.last_insert_rowid();

        let mut laps = Vec::with_capacity(new.laps.len());
        for lap in &new.laps {
            let lap_result = sqlx::query(
                "INSERT INTO laps \
                 (activity_id, lap_number, distance, time, pace, avg_hr, max_hr, avg_cadence) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(activity_id)
            .bind(lap.lap_number)
            .bind(lap.distance)
            .bind(lap.time)
            .bind(lap.pace)
            .bind(lap.avg_hr)
            .bind(lap.max_hr)
            .bind(lap.avg_cadence)
            .execute(&mut *tx)
            .await?;

            laps.push(Lap {
                id: lap_result.last_insert_rowid(),
                activity_id,
                lap_number: lap.lap_number,
                distance: lap.distance,
                time: lap.time,
                pace: lap.pace,
                avg_hr: lap.avg_hr,
                max_hr: lap.max_hr,
                avg_cadence: lap.avg_cadence,
            });
        }

        tx.commit().await?;

        Ok(ActivityDetail {
            activity: Activity {
                id: activity_id,
                user_id,
                start_time: new.start_time,
                total_distance: new.total_distance,
                total_time: new.total_time,
                avg_pace: new.avg_pace,
                avg_hr: new.avg_hr,
                avg_cadence: new.avg_cadence,
                fingerprint: new.fingerprint.clone(),
            },
            laps,
        })
    }

    pub async fn find_activity_by_fingerprint(
        &self,
        user_id: i64,
        fingerprint: &str,
    ) -> Result<Option<Activity>, AppError> {
        Ok(sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE user_id = ? AND fingerprint = ?",
        )
        .bind(user_id)
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// All of a user's activities, most recent first.
    pub async fn list_activities(&self, user_id: i64) -> Result<Vec<Activity>, AppError> {
        Ok(sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE user_id = ? ORDER BY start_time DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Fetch an activity regardless of owner. Callers are responsible for
    /// distinguishing NotFound from Forbidden.
    pub async fn get_activity_any(&self, activity_id: i64) -> Result<Option<Activity>, AppError> {
        Ok(
            sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
                .bind(activity_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn get_activity(
        &self,
        user_id: i64,
        activity_id: i64,
    ) -> Result<Option<Activity>, AppError> {
        Ok(sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE id = ? AND user_id = ?",
        )
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn get_laps(&self, activity_id: i64) -> Result<Vec<Lap>, AppError> {
        Ok(sqlx::query_as::<_, Lap>(
            "SELECT * FROM laps WHERE activity_id = ? ORDER BY lap_number ASC",
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Delete an activity, its laps, and clear any race links pointing at
    /// it, all in one transaction.
    pub async fn delete_activity(&self, user_id: i64, activity_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE races SET activity_id = NULL WHERE activity_id = ? AND user_id = ?")
            .bind(activity_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM laps WHERE activity_id = ?")
            .bind(activity_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM activities WHERE id = ? AND user_id = ?")
            .bind(activity_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Activities with `from <= start_time < to` (stored-timestamp range).
    pub async fn activities_between(
        &self,
        user_id: i64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Activity>, AppError> {
        Ok(sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities \
             WHERE user_id = ? AND start_time >= ? AND start_time < ? \
             ORDER BY start_time ASC",
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn recent_activities(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Activity>, AppError> {
        Ok(sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE user_id = ? \
             ORDER BY start_time DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Race Operations ─────────────────────────────────────────

    /// Register a race. Status starts as scheduled; no activity is linked.
    pub async fn create_race(&self, user_id: i64, new: &NewRace) -> Result<Race, AppError> {
        let result = sqlx::query(
            "INSERT INTO races \
             (user_id, race_name, race_date, location, distance_type, distance_custom, target_time, actual_time, status, activity_id, review) \
             VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, NULL, NULL)",
        )
        .bind(user_id)
        .bind(&new.race_name)
        .bind(new.race_date)
        .bind(&new.location)
        .bind(new.distance_type)
        .bind(new.distance_custom)
        .bind(new.target_time)
        .bind(RaceStatus::Scheduled)
        .execute(&self.pool)
        .await?;

        Ok(Race {
            id: result.last_insert_rowid(),
            user_id,
            race_name: new.race_name.clone(),
            race_date: new.race_date,
            location: new.location.clone(),
            distance_type: new.distance_type,
            distance_custom: new.distance_custom,
            target_time: new.target_time,
            actual_time: None,
            status: RaceStatus::Scheduled,
            activity_id: None,
            review: None,
        })
    }

    /// Persist every mutable field of a race.
    pub async fn update_race(&self, race: &Race) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE races SET \
             race_name = ?, race_date = ?, location = ?, distance_type = ?, distance_custom = ?, \
             target_time = ?, actual_time = ?, status = ?, activity_id = ?, review = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&race.race_name)
        .bind(race.race_date)
        .bind(&race.location)
        .bind(race.distance_type)
        .bind(race.distance_custom)
        .bind(race.target_time)
        .bind(race.actual_time)
        .bind(race.status)
        .bind(race.activity_id)
        .bind(&race.review)
        .bind(race.id)
        .bind(race.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_race(&self, user_id: i64, race_id: i64) -> Result<Option<Race>, AppError> {
        Ok(
            sqlx::query_as::<_, Race>("SELECT * FROM races WHERE id = ? AND user_id = ?")
                .bind(race_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// A user's races, optionally filtered by status, most recent date first.
    pub async fn list_races(
        &self,
        user_id: i64,
        status: Option<RaceStatus>,
    ) -> Result<Vec<Race>, AppError> {
        let races = match status {
            Some(status) => {
                sqlx::query_as::<_, Race>(
                    "SELECT * FROM races WHERE user_id = ? AND status = ? ORDER BY race_date DESC",
                )
                .bind(user_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Race>(
                    "SELECT * FROM races WHERE user_id = ? ORDER BY race_date DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(races)
    }

    /// Races on or after `now`, soonest first.
    pub async fn upcoming_races(
        &self,
        user_id: i64,
        now: NaiveDateTime,
    ) -> Result<Vec<Race>, AppError> {
        Ok(sqlx::query_as::<_, Race>(
            "SELECT * FROM races WHERE user_id = ? AND race_date >= ? ORDER BY race_date ASC",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Delete a race and its image metadata. The linked activity, if any,
    /// is left untouched. Image files are the caller's cleanup.
    pub async fn delete_race(&self, user_id: i64, race_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM race_images WHERE race_id = ?")
            .bind(race_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM races WHERE id = ? AND user_id = ?")
            .bind(race_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ─── Race Image Operations ───────────────────────────────────

    pub async fn list_race_images(&self, race_id: i64) -> Result<Vec<RaceImage>, AppError> {
        Ok(sqlx::query_as::<_, RaceImage>(
            "SELECT * FROM race_images WHERE race_id = ? ORDER BY uploaded_at ASC, id ASC",
        )
        .bind(race_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn count_race_images(&self, race_id: i64) -> Result<i64, AppError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM race_images WHERE race_id = ?")
                .bind(race_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    pub async fn insert_race_image(
        &self,
        race_id: i64,
        filename: &str,
        original_name: &str,
        uploaded_at: NaiveDateTime,
    ) -> Result<RaceImage, AppError> {
        let result = sqlx::query(
            "INSERT INTO race_images (race_id, filename, original_name, uploaded_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(race_id)
        .bind(filename)
        .bind(original_name)
        .bind(uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(RaceImage {
            id: result.last_insert_rowid(),
            race_id,
            filename: filename.to_string(),
            original_name: original_name.to_string(),
            uploaded_at,
        })
    }

    pub async fn get_race_image(
        &self,
        race_id: i64,
        image_id: i64,
    ) -> Result<Option<RaceImage>, AppError> {
        Ok(sqlx::query_as::<_, RaceImage>(
            "SELECT * FROM race_images WHERE id = ? AND race_id = ?",
        )
        .bind(image_id)
        .bind(race_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn delete_race_image(&self, race_id: i64, image_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM race_images WHERE id = ? AND race_id = ?")
            .bind(image_id)
            .bind(race_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}
