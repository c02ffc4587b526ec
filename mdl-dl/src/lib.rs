//! mdl-dl - music download service
//!
//! Accepts a music source (URL, search phrase, pasted playlist text, or a
//! free-text vibe description) over HTTP, resolves it to audio downloads
//! through the external media resolver, and tracks each request as a
//! pollable job.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod models;
pub mod playlist_text;
pub mod services;
pub mod store;

use config::Config;
use services::downloader::Downloader;
use services::vibe::VibeClient;
use store::JobStore;

/// Application state shared across HTTP handlers and job tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<JobStore>,
    pub downloader: Arc<Downloader>,
    pub vibe: Arc<VibeClient>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, store: JobStore, downloader: Downloader, vibe: VibeClient) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            downloader: Arc::new(downloader),
            vibe: Arc::new(vibe),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/jobs", post(api::submit_job).get(api::list_jobs))
        .route("/api/jobs/:job_id", get(api::get_job))
        .merge(api::health_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
}
