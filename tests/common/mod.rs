// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use runlog::config::Config;
use runlog::db::Database;
use runlog::routes::create_router;
use runlog::AppState;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

/// Test app over an in-memory database and a throwaway upload directory.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    // Held so uploaded files survive for the duration of the test
    _upload_dir: tempfile::TempDir,
}

#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let mut config = Config::test_default();
    let upload_dir = tempfile::tempdir().expect("Failed to create temp upload dir");
    config.upload_dir = upload_dir.path().to_path_buf();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let state = Arc::new(AppState::new(config, db));
    TestApp {
        router: create_router(state.clone()),
        state,
        _upload_dir: upload_dir,
    }
}

/// Run one request and return status + parsed JSON body (Null when empty).
#[allow(dead_code)]
pub async fn request(app: &TestApp, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app
        .router
        .clone()
        .oneshot(req)
        .await
        .expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };
    (status, json)
}

#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

#[allow(dead_code)]
pub fn bytes_request(method: &str, uri: &str, token: Option<&str>, bytes: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(bytes))
        .expect("Failed to build request")
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

/// Register a user and return a bearer token for them.
#[allow(dead_code)]
pub async fn register_and_login(app: &TestApp, email: &str) -> String {
    let credentials = serde_json::json!({"email": email, "password": "password123"});

    let (status, _) = request(
        app,
        json_request("POST", "/auth/register", None, &credentials),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(app, json_request("POST", "/auth/login", None, &credentials)).await;
    assert_eq!(status, StatusCode::OK);
    body["access_token"]
        .as_str()
        .expect("No access_token in login response")
        .to_string()
}

/// Minimal valid TCX document. Laps are `(distance_meters, time_seconds)`.
#[allow(dead_code)]
pub fn sample_tcx(start: &str, laps: &[(f64, f64)]) -> String {
    let mut lap_xml = String::new();
    for (distance, time) in laps {
        lap_xml.push_str(&format!(
            "      <Lap>\n        <TotalTimeSeconds>{}</TotalTimeSeconds>\n        <DistanceMeters>{}</DistanceMeters>\n      </Lap>\n",
            time, distance
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <TrainingCenterDatabase xmlns=\"http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2\">\n\
         \x20 <Activities>\n\
         \x20   <Activity Sport=\"Running\">\n\
         \x20     <Id>{}</Id>\n{}\
         \x20   </Activity>\n\
         \x20 </Activities>\n\
         </TrainingCenterDatabase>\n",
        start, lap_xml
    )
}

/// Upload a TCX through the plain activity endpoint.
#[allow(dead_code)]
pub async fn upload_activity(
    app: &TestApp,
    token: &str,
    filename: &str,
    tcx: &str,
) -> (StatusCode, serde_json::Value) {
    request(
        app,
        bytes_request(
            "POST",
            &format!("/activities/upload?filename={}", filename),
            Some(token),
            tcx.as_bytes().to_vec(),
        ),
    )
    .await
}
