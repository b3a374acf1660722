// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Runlog: personal running log and race tracking API
//!
//! This crate provides the backend for uploading TCX workout files,
//! deriving per-lap and aggregate metrics, and tracking races against
//! recorded activities.

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{ActivityIngestor, DashboardAggregator, RaceImageStore, RaceLinkageManager};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub ingestor: ActivityIngestor,
    pub races: RaceLinkageManager,
    pub dashboard: DashboardAggregator,
    pub images: RaceImageStore,
}

impl AppState {
    /// Wire up services over a connected database.
    pub fn new(config: Config, db: Database) -> Self {
        let ingestor = ActivityIngestor::new(db.clone());
        let races = RaceLinkageManager::new(db.clone(), ingestor.clone());
        let dashboard = DashboardAggregator::new(db.clone());
        let images = RaceImageStore::new(db.clone(), config.upload_dir.clone());
        Self {
            config,
            db,
            ingestor,
            races,
            dashboard,
            images,
        }
    }
}
