//! Download job record and lifecycle state machine
//!
//! A job progresses `queued` → (`generating`) → `downloading` → one of the
//! terminal states. Terminal states are never left.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::InputKind;
use crate::models::{DownloadSummary, FailedTrack};

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, background task not yet running
    Queued,
    /// Expanding a vibe description into a track list
    Generating,
    /// Resolving and downloading audio
    Downloading,
    /// Every item came through
    Completed,
    /// Some items came through, some failed
    CompletedWithErrors,
    /// Nothing came through
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::CompletedWithErrors | JobStatus::Failed
        )
    }
}

/// A persisted record tracking one user-submitted request from creation
/// to terminal outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub input_type: InputKind,
    pub input_value: String,
    pub status: JobStatus,
    pub total_tracks: usize,
    pub completed_tracks: usize,
    pub failed_tracks: usize,
    /// Append-only human-readable failure detail
    pub error_messages: Vec<String>,
    pub failed_track_details: Vec<FailedTrack>,
    pub output_directory: String,
    pub created_at: DateTime<Utc>,
    /// Stamped once, at the first terminal transition
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(input_type: InputKind, input_value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_type,
            input_value: input_value.into(),
            status: JobStatus::Queued,
            total_tracks: 0,
            completed_tracks: 0,
            failed_tracks: 0,
            error_messages: Vec::new(),
            failed_track_details: Vec::new(),
            output_directory: String::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to a new lifecycle state
    ///
    /// Terminal states are final: an attempted transition out of one is
    /// logged and ignored.
    pub fn transition_to(&mut self, new_status: JobStatus) {
        if self.status.is_terminal() {
            tracing::warn!(
                job_id = %self.id,
                current = ?self.status,
                requested = ?new_status,
                "Refusing transition out of terminal state"
            );
            return;
        }
        self.status = new_status;
        if new_status.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }

    /// Fold a download result into this job and decide the terminal state
    ///
    /// `completed` when nothing failed and something completed;
    /// `completed_with_errors` when both counters are positive; `failed`
    /// when nothing completed, regardless of the failure count.
    pub fn apply_summary(&mut self, summary: DownloadSummary) {
        self.total_tracks = summary.total;
        self.completed_tracks = summary.completed;
        self.failed_tracks = summary.failed;
        self.failed_track_details = summary.failed_tracks;
        self.error_messages.extend(summary.errors);
        if !summary.output_dir.is_empty() {
            self.output_directory = summary.output_dir;
        }

        let terminal = if self.completed_tracks > 0 {
            if self.failed_tracks == 0 {
                JobStatus::Completed
            } else {
                JobStatus::CompletedWithErrors
            }
        } else {
            JobStatus::Failed
        };
        self.transition_to(terminal);
    }

    /// Force the job into the failed state with an explanatory message
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_messages.push(message.into());
        self.transition_to(JobStatus::Failed);
    }
}
