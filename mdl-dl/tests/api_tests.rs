//! Integration tests for the mdl-dl HTTP API
//!
//! Tests cover:
//! - Health endpoint
//! - Job submission branching: empty input, pasted playlist text,
//!   vibe descriptions with an unreachable generator, search queries
//! - Job polling: snapshot list, single record, unknown id
//!
//! The generation backend is pointed at a closed local port so the vibe
//! probe fails fast, and the media resolver binary name is one that does
//! not exist, so no real downloads are attempted.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use mdl_dl::config::Config;
use mdl_dl::services::downloader::Downloader;
use mdl_dl::services::resolver::MediaResolver;
use mdl_dl::services::vibe::VibeClient;
use mdl_dl::store::JobStore;
use mdl_dl::{build_router, AppState};

/// Test helper: app rooted in a temp dir
fn setup_app(dir: &TempDir) -> axum::Router {
    let root = dir.path();
    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        output_dir: root.join("downloads"),
        logs_dir: root.join("logs"),
        jobs_file: root.join("jobs.json"),
        ollama_url: "http://127.0.0.1:1".to_string(),
        ollama_model: "test-model".to_string(),
        ytdlp_binary: "yt-dlp-test-missing".to_string(),
        default_track_count: 5,
    };
    config.ensure_directories().unwrap();

    let store = JobStore::load(&config.jobs_file, &config.logs_dir);
    let resolver = Arc::new(MediaResolver::new(config.ytdlp_binary.clone()));
    let downloader = Downloader::new(resolver, config.output_dir.clone());
    let vibe = VibeClient::new(config.ollama_url.clone(), config.ollama_model.clone()).unwrap();

    build_router(AppState::new(config, store, downloader, vibe))
}

/// Test helper: POST request with a JSON body
fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: plain GET request
fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn health_endpoint_reports_module_and_version() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mdl-dl");
    assert!(body["version"].is_string());
}

// =============================================================================
// Submission Validation
// =============================================================================

#[tokio::test]
async fn empty_input_is_rejected_without_creating_a_job() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .clone()
        .oneshot(post_json("/api/jobs", json!({"input": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let response = app.oneshot(get("/api/jobs")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unparseable_pasted_playlist_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    // Looks pasted (multi-line, leading digit) but every line is a bare
    // duration, so no tracks come out
    let response = app
        .oneshot(post_json("/api/jobs", json!({"input": "1:23\n4:56"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Could not parse playlist text"));
}

#[tokio::test]
async fn vibe_submission_returns_503_when_generator_is_down() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/jobs",
            json!({"input": "upbeat workout playlist"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

    // No job record is left behind
    let response = app.oneshot(get("/api/jobs")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

// =============================================================================
// Accepted Submissions
// =============================================================================

#[tokio::test]
async fn search_submission_is_accepted_and_pollable() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .clone()
        .oneshot(post_json("/api/jobs", json!({"input": "MGMT - Kids"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = extract_json(response.into_body()).await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    assert_eq!(body["message"], "Download started...");

    let response = app
        .oneshot(get(&format!("/api/jobs/{}", job_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["id"], job_id.as_str());
    assert_eq!(body["input_type"], "search_query");
    assert_eq!(body["input_value"], "MGMT - Kids");
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn pasted_playlist_submission_reports_track_count() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let pasted = "1. Kids\nMGMT\n3:45\n2. Sleepyhead\nPassion Pit\n4:12";
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/jobs",
            json!({"input": pasted, "playlist_name": "indie_mix"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Downloading 2 tracks...");
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/api/jobs/{}", job_id)))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["input_type"], "pasted_playlist");
    assert_eq!(body["input_value"], "2 tracks");
}

#[tokio::test]
async fn url_submission_is_classified_from_the_url() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/jobs",
            json!({"input": "https://music.example.com/watch?v=abc"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = extract_json(response.into_body()).await;
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/api/jobs/{}", job_id)))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["input_type"], "youtube_video");
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test]
async fn unknown_job_id_is_a_404() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    let response = app
        .oneshot(get(&format!("/api/jobs/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn job_list_returns_full_snapshot() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(&dir);

    for input in ["MGMT - Kids", "Daft Punk - One More Time"] {
        let response = app
            .clone()
            .oneshot(post_json("/api/jobs", json!({"input": input})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app.oneshot(get("/api/jobs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    for job in jobs {
        assert_eq!(job["input_type"], "search_query");
        assert!(job["status"].is_string());
    }
}
