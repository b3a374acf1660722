// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard route.

use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::dashboard::DashboardData;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(get_dashboard))
}

/// Upcoming races, the current month's daily running grid, and recent
/// activities in one payload.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardData>> {
    let data = state
        .dashboard
        .build(
            user.user_id,
            chrono::Utc::now().naive_utc(),
            state.config.display_utc_offset_hours,
        )
        .await?;
    Ok(Json(data))
}
