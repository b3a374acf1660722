// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race routes: CRUD, result entry, TCX linking, images.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::db::NewRace;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DistanceType, RaceImage, RaceOut, RaceStatus};
use crate::services::images::content_type_for;
use crate::services::linkage::{RaceEdit, RaceResultPatch};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/races", post(create).get(list))
        .route(
            "/races/{race_id}",
            get(get_one).put(update).delete(delete_race),
        )
        .route("/races/{race_id}/result", put(update_result))
        .route("/races/{race_id}/upload-tcx", post(upload_tcx))
        .route("/races/{race_id}/images", post(upload_image))
        .route("/races/{race_id}/images/{image_id}", delete(delete_image))
}

/// Image bytes are served without auth by stable URL, so the frontend can
/// use plain `<img>` tags.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/races/{race_id}/images/{image_id}/file",
        get(get_image_file),
    )
}

/// Deserialize a present-but-null field as `Some(None)`; an absent field
/// stays `None` via `#[serde(default)]`. This keeps "clear this field"
/// distinct from "leave it alone" in partial updates.
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ─── Race CRUD ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RaceCreateRequest {
    #[validate(length(min = 1, max = 200, message = "race_name must be 1-200 characters"))]
    pub race_name: String,
    pub race_date: NaiveDateTime,
    pub location: Option<String>,
    pub distance_type: DistanceType,
    pub distance_custom: Option<f64>,
    pub target_time: Option<f64>,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RaceCreateRequest>,
) -> Result<(StatusCode, Json<RaceOut>)> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let race = state
        .races
        .create(
            user.user_id,
            NewRace {
                race_name: payload.race_name,
                race_date: payload.race_date,
                location: payload.location,
                distance_type: payload.distance_type,
                distance_custom: payload.distance_custom,
                target_time: payload.target_time,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(state.races.project(race).await?)))
}

#[derive(Deserialize)]
struct ListParams {
    status: Option<String>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RaceOut>>> {
    let status = params
        .status
        .as_deref()
        .map(|raw| {
            RaceStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown race status: {}", raw)))
        })
        .transpose()?;

    let races = state.db.list_races(user.user_id, status).await?;
    let mut out = Vec::with_capacity(races.len());
    for race in races {
        out.push(state.races.project(race).await?);
    }
    Ok(Json(out))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(race_id): Path<i64>,
) -> Result<Json<RaceOut>> {
    let race = state.races.get(user.user_id, race_id).await?;
    Ok(Json(state.races.project(race).await?))
}

#[derive(Deserialize)]
pub struct RaceUpdateRequest {
    pub race_name: Option<String>,
    pub race_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub distance_type: Option<DistanceType>,
    #[serde(default, deserialize_with = "double_option")]
    pub distance_custom: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_time: Option<Option<f64>>,
}

async fn update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(race_id): Path<i64>,
    Json(payload): Json<RaceUpdateRequest>,
) -> Result<Json<RaceOut>> {
    if let Some(name) = payload.race_name.as_deref() {
        if name.is_empty() || name.len() > 200 {
            return Err(AppError::Validation(
                "race_name must be 1-200 characters".to_string(),
            ));
        }
    }

    let race = state
        .races
        .update(
            user.user_id,
            race_id,
            RaceEdit {
                race_name: payload.race_name,
                race_date: payload.race_date,
                location: payload.location,
                distance_type: payload.distance_type,
                distance_custom: payload.distance_custom,
                target_time: payload.target_time,
            },
        )
        .await?;
    Ok(Json(state.races.project(race).await?))
}

async fn delete_race(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(race_id): Path<i64>,
) -> Result<StatusCode> {
    let images = state.races.delete(user.user_id, race_id).await?;
    state.images.remove_files(race_id, &images).await;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Result Entry & Activity Link ────────────────────────────

#[derive(Deserialize)]
pub struct RaceResultRequest {
    pub status: RaceStatus,
    #[serde(default, deserialize_with = "double_option")]
    pub actual_time: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub activity_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub review: Option<Option<String>>,
}

async fn update_result(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(race_id): Path<i64>,
    Json(payload): Json<RaceResultRequest>,
) -> Result<Json<RaceOut>> {
    let race = state
        .races
        .update_result(
            user.user_id,
            race_id,
            RaceResultPatch {
                status: payload.status,
                actual_time: payload.actual_time,
                activity_id: payload.activity_id,
                review: payload.review,
            },
        )
        .await?;
    Ok(Json(state.races.project(race).await?))
}

#[derive(Deserialize)]
struct UploadParams {
    filename: String,
}

/// Upload a TCX for a race: creates the activity (or reuses an identical
/// one) and links it, replacing any previous link.
async fn upload_tcx(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(race_id): Path<i64>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<RaceOut>> {
    let race = state
        .races
        .link_by_upload(user.user_id, race_id, &params.filename, &body)
        .await?;
    Ok(Json(state.races.project(race).await?))
}

// ─── Images ──────────────────────────────────────────────────

async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(race_id): Path<i64>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<RaceImage>)> {
    let race = state.races.get(user.user_id, race_id).await?;
    let image = state.images.store(race.id, &params.filename, &body).await?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn delete_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((race_id, image_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    let race = state.races.get(user.user_id, race_id).await?;
    let image = state
        .db
        .get_race_image(race.id, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    state.images.remove(&image).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_image_file(
    State(state): State<Arc<AppState>>,
    Path((race_id, image_id)): Path<(i64, i64)>,
) -> Result<([(header::HeaderName, String); 1], Vec<u8>)> {
    let image = state
        .db
        .get_race_image(race_id, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    let path = state.images.file_path(race_id, &image.filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound("Image file not found".to_string()))?;

    Ok((
        [(
            header::CONTENT_TYPE,
            content_type_for(&image.filename).to_string(),
        )],
        bytes,
    ))
}
