// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Business logic services.

pub mod dashboard;
pub mod filter;
pub mod images;
pub mod ingest;
pub mod linkage;
pub mod tcx;

pub use dashboard::DashboardAggregator;
pub use images::RaceImageStore;
pub use ingest::ActivityIngestor;
pub use linkage::RaceLinkageManager;
