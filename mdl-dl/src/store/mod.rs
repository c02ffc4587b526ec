//! Job store: in-memory job map mirrored to a durable JSON file
//!
//! Every mutation rewrites the whole file while the store lock is held,
//! so concurrent background tasks cannot interleave writes. Loading
//! tolerates a missing or corrupt file: the service starts with an empty
//! map and logs what happened. Jobs are never deleted; the file grows
//! until manually cleared.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::classify::InputKind;
use crate::models::Job;

pub struct JobStore {
    jobs_file: PathBuf,
    logs_dir: PathBuf,
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl JobStore {
    /// Load the store from disk, or start empty
    pub fn load(jobs_file: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        let jobs_file = jobs_file.into();
        let jobs = match fs::read_to_string(&jobs_file) {
            Ok(raw) => match serde_json::from_str::<HashMap<Uuid, Job>>(&raw) {
                Ok(map) => {
                    tracing::info!(count = map.len(), "Loaded jobs from {}", jobs_file.display());
                    map
                }
                Err(e) => {
                    tracing::warn!(
                        "Jobs file {} is corrupt, starting empty: {}",
                        jobs_file.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Could not read jobs file {}: {}", jobs_file.display(), e);
                HashMap::new()
            }
        };

        Self {
            jobs_file,
            logs_dir: logs_dir.into(),
            jobs: Mutex::new(jobs),
        }
    }

    /// Create a new queued job and persist it
    pub fn create(&self, input_type: InputKind, input_value: impl Into<String>) -> Job {
        let job = Job::new(input_type, input_value);
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(job.id, job.clone());
        self.persist(&jobs);
        job
    }

    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.lock().unwrap().get(&id).cloned()
    }

    /// Full snapshot, newest first
    pub fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.lock().unwrap();
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Overwrite a job record and persist the map
    pub fn update(&self, job: &Job) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(job.id, job.clone());
        self.persist(&jobs);
    }

    /// Rewrite the whole jobs file; called with the lock held
    fn persist(&self, jobs: &HashMap<Uuid, Job>) {
        let serialized = match serde_json::to_string_pretty(jobs) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Could not serialize jobs: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.jobs_file, serialized) {
            tracing::error!(
                "Could not write jobs file {}: {}",
                self.jobs_file.display(),
                e
            );
        }
    }

    /// Write the failed-track table for a job
    ///
    /// One file per job, named by job id; a job with no failed items
    /// produces no file.
    pub fn export_failures(&self, job: &Job) {
        if job.failed_track_details.is_empty() {
            return;
        }

        let path = self.logs_dir.join(format!("failed_tracks_{}.csv", job.id));
        let mut out = String::from("artist,title,error\n");
        for track in &job.failed_track_details {
            out.push_str(&format!(
                "{},{},{}\n",
                csv_field(&track.artist),
                csv_field(&track.title),
                csv_field(&track.error)
            ));
        }

        match fs::write(&path, out) {
            Ok(()) => {
                tracing::info!(job_id = %job.id, "Failed tracks exported to {}", path.display())
            }
            Err(e) => {
                tracing::error!(job_id = %job.id, "Could not write failed-tracks file: {}", e)
            }
        }
    }
}

/// Quote a CSV field only when it needs quoting
fn csv_field(value: &str) -> String {
    if value.contains(|c| c == ',' || c == '"' || c == '\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("MGMT"), "MGMT");
        assert_eq!(csv_field("Tyler, The Creator"), "\"Tyler, The Creator\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
