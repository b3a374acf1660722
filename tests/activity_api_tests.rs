// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity upload, duplicate detection, listing, filters, delete.

mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn test_upload_creates_activity_with_derived_metrics() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let tcx = sample_tcx("2024-05-01T00:00:00Z", &[(5000.0, 1500.0), (5000.0, 1500.0)]);
    let (status, body) = upload_activity(&app, &token, "run1.tcx", &tcx).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_distance"], 10000.0);
    assert_eq!(body["total_time"], 3000.0);
    assert_eq!(body["avg_pace"], 300.0);
    assert_eq!(body["start_time"], "2024-05-01T00:00:00");

    let laps = body["laps"].as_array().unwrap();
    assert_eq!(laps.len(), 2);
    // Lap numbers are contiguous ascending from 1
    for (i, lap) in laps.iter().enumerate() {
        assert_eq!(lap["lap_number"], (i + 1) as i64);
    }
    assert_eq!(laps[0]["pace"], 300.0);
}

#[tokio::test]
async fn test_duplicate_upload_is_conflict() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let tcx = sample_tcx("2024-05-01T00:00:00Z", &[(10000.0, 3000.0)]);
    let (status, _) = upload_activity(&app, &token, "run1.tcx", &tcx).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = upload_activity(&app, &token, "run1.tcx", &tcx).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_activity");
    assert!(body["details"].as_str().unwrap().contains("2024-05-01"));

    // Still exactly one activity
    let (_, list) = request(&app, empty_request("GET", "/activities", Some(&token))).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_detection_is_content_based_not_byte_based() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let tcx = sample_tcx("2024-05-01T00:00:00Z", &[(10000.0, 3000.0)]);
    upload_activity(&app, &token, "run1.tcx", &tcx).await;

    // Same workout, different XML formatting
    let reformatted = tcx.replace('\n', " \n");
    let (status, _) = upload_activity(&app, &token, "export-again.tcx", &reformatted).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_same_content_different_users_both_succeed() {
    let app = create_test_app().await;
    let token_a = register_and_login(&app, "a@example.com").await;
    let token_b = register_and_login(&app, "b@example.com").await;

    let tcx = sample_tcx("2024-05-01T00:00:00Z", &[(10000.0, 3000.0)]);
    let (status, _) = upload_activity(&app, &token_a, "run.tcx", &tcx).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = upload_activity(&app, &token_b, "run.tcx", &tcx).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_upload_rejects_non_tcx_extension() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let tcx = sample_tcx("2024-05-01T00:00:00Z", &[(10000.0, 3000.0)]);
    let (status, body) = upload_activity(&app, &token, "run1.gpx", &tcx).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_file_type");
}

#[tokio::test]
async fn test_upload_rejects_unreadable_file() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let (status, body) = request(
        &app,
        bytes_request(
            "POST",
            "/activities/upload?filename=run1.tcx",
            Some(&token),
            b"this is not a tcx file".to_vec(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "malformed_file");
}

#[tokio::test]
async fn test_zero_distance_activity_has_no_pace() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let tcx = sample_tcx("2024-05-01T00:00:00Z", &[(0.0, 1800.0)]);
    let (status, body) = upload_activity(&app, &token, "treadmill.tcx", &tcx).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["avg_pace"].is_null());
    assert!(body["laps"][0]["pace"].is_null());
}

#[tokio::test]
async fn test_list_is_most_recent_first() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    upload_activity(
        &app,
        &token,
        "a.tcx",
        &sample_tcx("2024-05-01T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;
    upload_activity(
        &app,
        &token,
        "b.tcx",
        &sample_tcx("2024-05-03T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;
    upload_activity(
        &app,
        &token,
        "c.tcx",
        &sample_tcx("2024-05-02T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;

    let (status, list) = request(&app, empty_request("GET", "/activities", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["start_time"].as_str().unwrap())
        .collect();
    assert_eq!(
        starts,
        vec![
            "2024-05-03T06:00:00",
            "2024-05-02T06:00:00",
            "2024-05-01T06:00:00"
        ]
    );
}

#[tokio::test]
async fn test_get_detail_and_ownership() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;
    let other = register_and_login(&app, "other@example.com").await;

    let tcx = sample_tcx("2024-05-01T06:00:00Z", &[(5000.0, 1500.0)]);
    let (_, created) = upload_activity(&app, &token, "run.tcx", &tcx).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        empty_request("GET", &format!("/activities/{}", id), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["laps"].as_array().unwrap().len(), 1);

    // Someone else's activity is forbidden, not invisible
    let (status, body) = request(
        &app,
        empty_request("GET", &format!("/activities/{}", id), Some(&other)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // A missing activity is not found
    let (status, _) = request(
        &app,
        empty_request("GET", "/activities/99999", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_activity() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let tcx = sample_tcx("2024-05-01T06:00:00Z", &[(5000.0, 1500.0)]);
    let (_, created) = upload_activity(&app, &token, "run.tcx", &tcx).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        empty_request("DELETE", &format!("/activities/{}", id), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        empty_request("GET", &format!("/activities/{}", id), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting also allows re-uploading the same content
    let (status, _) = upload_activity(&app, &token, "run.tcx", &tcx).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_filters_years_and_months() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    // Display offset is +9, so these UTC morning starts stay on their dates
    upload_activity(
        &app,
        &token,
        "a.tcx",
        &sample_tcx("2023-03-10T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;
    upload_activity(
        &app,
        &token,
        "b.tcx",
        &sample_tcx("2024-05-02T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;
    upload_activity(
        &app,
        &token,
        "c.tcx",
        &sample_tcx("2024-02-20T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;

    let (status, body) = request(
        &app,
        empty_request("GET", "/activities/filters", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["years"], serde_json::json!([2024, 2023]));
    assert_eq!(body["months"], serde_json::json!([5, 3, 2]));

    let (_, body) = request(
        &app,
        empty_request("GET", "/activities/filters?year=2024", Some(&token)),
    )
    .await;
    assert_eq!(body["months"], serde_json::json!([5, 2]));

    // A year with no activities has no months
    let (_, body) = request(
        &app,
        empty_request("GET", "/activities/filters?year=2019", Some(&token)),
    )
    .await;
    assert_eq!(body["months"], serde_json::json!([]));
}

#[tokio::test]
async fn test_filters_empty_list() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    let (status, body) = request(
        &app,
        empty_request("GET", "/activities/filters", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["years"], serde_json::json!([]));
    assert_eq!(body["months"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_filtered_by_year_and_month() {
    let app = create_test_app().await;
    let token = register_and_login(&app, "runner@example.com").await;

    upload_activity(
        &app,
        &token,
        "a.tcx",
        &sample_tcx("2024-05-02T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;
    upload_activity(
        &app,
        &token,
        "b.tcx",
        &sample_tcx("2024-02-20T06:00:00Z", &[(5000.0, 1500.0)]),
    )
    .await;

    let (_, list) = request(
        &app,
        empty_request("GET", "/activities?year=2024&month=5", Some(&token)),
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["start_time"], "2024-05-02T06:00:00");

    let (_, list) = request(
        &app,
        empty_request("GET", "/activities?year=2024", Some(&token)),
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}
