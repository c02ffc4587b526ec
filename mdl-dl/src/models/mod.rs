//! Data model for jobs, tracks and download results

pub mod job;
pub mod track;

pub use job::{Job, JobStatus};
pub use track::{DownloadSummary, FailedTrack, Track};
