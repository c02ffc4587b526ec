//! HTTP API handlers

pub mod health;
pub mod jobs;

pub use health::health_routes;
pub use jobs::{get_job, list_jobs, submit_job};
