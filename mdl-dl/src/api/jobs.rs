//! Job submission and polling handlers
//!
//! POST creates a job and spawns its background task; the GET endpoints
//! poll. Every task body ends in exactly one terminal job-store update:
//! the inner functions return `Result` and the spawn wrapper force-fails
//! the job on error, so a task can never disappear without updating its
//! record.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{classify, InputKind};
use crate::error::{ApiError, ApiResult};
use crate::models::{DownloadSummary, Job, JobStatus, Track};
use crate::playlist_text::{looks_like_pasted_playlist, parse_pasted_playlist};
use crate::AppState;

/// POST /api/jobs request
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub input: String,
    pub playlist_name: Option<String>,
    pub num_tracks: Option<usize>,
}

/// POST /api/jobs response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub message: String,
}

/// POST /api/jobs
///
/// Classifies the input, creates a queued job and spawns the matching
/// background task. Replies 202 immediately; progress is polled via GET.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let input = request.input.trim().to_string();
    if input.is_empty() {
        return Err(ApiError::BadRequest("No input provided".to_string()));
    }

    // Pasted playlist text is parsed up front so a bad paste is rejected
    // without creating a job
    if looks_like_pasted_playlist(&input) {
        let tracks = parse_pasted_playlist(&input);
        if tracks.is_empty() {
            return Err(ApiError::BadRequest(
                "Could not parse playlist text".to_string(),
            ));
        }

        let collection = request
            .playlist_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "pasted_playlist".to_string());

        let job = state
            .store
            .create(InputKind::PastedPlaylist, format!("{} tracks", tracks.len()));
        let message = format!("Downloading {} tracks...", tracks.len());
        tracing::info!(job_id = %job.id, tracks = tracks.len(), "Pasted playlist job accepted");

        let task_state = state.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            let outcome = run_track_list_job(&task_state, job_id, tracks, &collection).await;
            settle_job(&task_state, job_id, outcome);
        });

        return Ok((
            StatusCode::ACCEPTED,
            Json(SubmitResponse { job_id, message }),
        ));
    }

    let (input_type, cleaned) = classify(&input);

    if input_type == InputKind::VibeDescription {
        // Fail fast with a clear message when the generator is down
        if !state.vibe.probe().await {
            return Err(ApiError::ServiceUnavailable(
                "Playlist generator is not reachable. Start it with: ollama serve".to_string(),
            ));
        }

        let num_tracks = request
            .num_tracks
            .unwrap_or(state.config.default_track_count);
        let job = state.store.create(InputKind::VibeDescription, cleaned.clone());
        tracing::info!(job_id = %job.id, "Vibe job accepted");

        let task_state = state.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            let outcome = run_vibe_job(&task_state, job_id, &cleaned, num_tracks).await;
            settle_job(&task_state, job_id, outcome);
        });

        return Ok((
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                job_id,
                message: "Generating playlist from vibe...".to_string(),
            }),
        ));
    }

    let job = state.store.create(input_type, cleaned.clone());
    tracing::info!(job_id = %job.id, input_type = %input_type, "Download job accepted");

    let task_state = state.clone();
    let job_id = job.id;
    tokio::spawn(async move {
        let outcome = run_download_job(&task_state, job_id, input_type, &cleaned).await;
        settle_job(&task_state, job_id, outcome);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            message: "Download started...".to_string(),
        }),
    ))
}

/// GET /api/jobs
///
/// Full snapshot of all job records, newest first.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.store.list())
}

/// GET /api/jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    state
        .store
        .get(job_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))
}

/// Task boundary guard: a failed task run must still leave its job in a
/// terminal state with the error recorded.
fn settle_job(state: &AppState, job_id: Uuid, outcome: anyhow::Result<()>) {
    if let Err(e) = outcome {
        tracing::error!(job_id = %job_id, error = %e, "Job task failed");
        if let Some(mut job) = state.store.get(job_id) {
            if !job.status.is_terminal() {
                job.fail(e.to_string());
                state.store.update(&job);
            }
        }
    }
}

/// One terminal update plus the failure export side channel
fn finish_job(state: &AppState, mut job: Job, summary: DownloadSummary) {
    job.apply_summary(summary);
    state.store.update(&job);
    if job.failed_tracks > 0 {
        state.store.export_failures(&job);
    }
    tracing::info!(
        job_id = %job.id,
        status = ?job.status,
        completed = job.completed_tracks,
        failed = job.failed_tracks,
        "Job finished"
    );
}

/// Background task body for URL and search downloads
async fn run_download_job(
    state: &AppState,
    job_id: Uuid,
    input_type: InputKind,
    input: &str,
) -> anyhow::Result<()> {
    let mut job = match state.store.get(job_id) {
        Some(job) => job,
        None => return Ok(()),
    };
    job.transition_to(JobStatus::Downloading);
    state.store.update(&job);

    let summary = match input_type {
        InputKind::YoutubeVideo
        | InputKind::YoutubePlaylist
        | InputKind::SpotifyTrack
        | InputKind::SpotifyAlbum
        | InputKind::SpotifyPlaylist => state.downloader.download_url(input).await,
        InputKind::SearchQuery => state.downloader.download_search(input).await,
        other => {
            let mut summary = DownloadSummary::default();
            summary
                .errors
                .push(format!("Input type {} is not downloadable directly", other));
            summary
        }
    };

    finish_job(state, job, summary);
    Ok(())
}

/// Background task body for vibe jobs: generate, then download
async fn run_vibe_job(
    state: &AppState,
    job_id: Uuid,
    vibe: &str,
    num_tracks: usize,
) -> anyhow::Result<()> {
    let mut job = match state.store.get(job_id) {
        Some(job) => job,
        None => return Ok(()),
    };
    job.transition_to(JobStatus::Generating);
    state.store.update(&job);

    let tracks = match state.vibe.generate(vibe, num_tracks).await {
        Ok(tracks) => tracks,
        Err(e) => {
            job.fail(format!("Failed to generate playlist from vibe: {}", e));
            state.store.update(&job);
            return Ok(());
        }
    };

    job.transition_to(JobStatus::Downloading);
    state.store.update(&job);

    let collection = sanitize_collection_name(vibe);
    let summary = state.downloader.download_track_list(&tracks, &collection).await;
    finish_job(state, job, summary);
    Ok(())
}

/// Background task body for pasted playlists
async fn run_track_list_job(
    state: &AppState,
    job_id: Uuid,
    tracks: Vec<Track>,
    collection: &str,
) -> anyhow::Result<()> {
    let mut job = match state.store.get(job_id) {
        Some(job) => job,
        None => return Ok(()),
    };
    job.transition_to(JobStatus::Downloading);
    state.store.update(&job);

    let summary = state.downloader.download_track_list(&tracks, collection).await;
    finish_job(state, job, summary);
    Ok(())
}

/// Collection directory name derived from the vibe text
fn sanitize_collection_name(vibe: &str) -> String {
    static NON_PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());
    let prefix: String = vibe.chars().take(50).collect();
    NON_PATH_RE.replace_all(&prefix, "_").into_owned()
}
