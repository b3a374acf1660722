// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod activity;
pub mod race;
pub mod user;

pub use activity::{Activity, ActivityBrief, ActivityDetail, Lap, NewActivity, NewLap};
pub use race::{DistanceType, Race, RaceImage, RaceOut, RaceStatus};
pub use user::User;
