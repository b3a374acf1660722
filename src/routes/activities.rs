// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity routes: TCX upload, listing, filters, detail, delete.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivityDetail};
use crate::services::filter;
use crate::time_utils;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activities/upload", post(upload))
        .route("/activities", get(list))
        .route("/activities/filters", get(filters))
        .route("/activities/{activity_id}", get(get_one).delete(delete_one))
}

#[derive(Deserialize)]
struct UploadParams {
    /// Original filename; the extension is validated server-side
    filename: String,
}

/// Upload a TCX file as a new activity.
///
/// 201 with the activity + laps, 409 on duplicate content, 400 on a
/// non-TCX filename or an unreadable file.
async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<ActivityDetail>)> {
    let detail = state
        .ingestor
        .ingest(user.user_id, &params.filename, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[derive(Deserialize)]
struct ListParams {
    /// Display-timezone calendar year
    year: Option<i32>,
    /// Display-timezone calendar month (1-12); only meaningful with `year`
    month: Option<u32>,
}

/// List activities, most recent first, optionally narrowed to a
/// display-zone year/month.
async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Activity>>> {
    let offset_hours = state.config.display_utc_offset_hours;
    let mut activities = state.db.list_activities(user.user_id).await?;

    if let Some(year) = params.year {
        activities.retain(|a| {
            let shown = time_utils::to_display(a.start_time, offset_hours);
            shown.year() == year && params.month.map_or(true, |m| shown.month() == m)
        });
    }

    Ok(Json(activities))
}

#[derive(Deserialize)]
struct FilterParams {
    /// Restrict the month set to one year; omitted = all years
    year: Option<i32>,
}

#[derive(Serialize)]
struct FiltersResponse {
    years: Vec<i32>,
    months: Vec<u32>,
}

/// Years and months that have at least one activity, for the filter UI.
async fn filters(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FilterParams>,
) -> Result<Json<FiltersResponse>> {
    let offset_hours = state.config.display_utc_offset_hours;
    let activities = state.db.list_activities(user.user_id).await?;

    Ok(Json(FiltersResponse {
        years: filter::years(&activities, offset_hours),
        months: filter::months(&activities, params.year, offset_hours),
    }))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<i64>,
) -> Result<Json<ActivityDetail>> {
    let activity = owned_activity(&state, user.user_id, activity_id).await?;
    let laps = state.db.get_laps(activity.id).await?;
    Ok(Json(ActivityDetail { activity, laps }))
}

/// Delete an activity. Any race linked to it is unlinked in the same
/// transaction; the race itself survives.
async fn delete_one(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<i64>,
) -> Result<StatusCode> {
    let activity = owned_activity(&state, user.user_id, activity_id).await?;
    state.db.delete_activity(user.user_id, activity.id).await?;
    tracing::info!(user_id = user.user_id, activity_id, "Activity deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch an activity, distinguishing "doesn't exist" from "not yours".
async fn owned_activity(
    state: &AppState,
    user_id: i64,
    activity_id: i64,
) -> Result<Activity> {
    let activity = state
        .db
        .get_activity_any(activity_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity not found".to_string()))?;
    if activity.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(activity)
}
