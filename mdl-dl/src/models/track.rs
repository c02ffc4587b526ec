//! Track and download-result value types

use serde::{Deserialize, Serialize};

/// An (artist, title) pair identifying a song to locate and download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub title: String,
}

impl Track {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Search query used to locate this track
    pub fn search_query(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

/// A track that could not be downloaded, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTrack {
    pub artist: String,
    pub title: String,
    pub error: String,
}

/// Aggregate outcome of one download operation
///
/// Produced by the downloader entry points and consumed exactly once to
/// update a job. `completed + failed` is expected to stay within `total`,
/// though nothing enforces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub success: bool,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub failed_tracks: Vec<FailedTrack>,
    pub output_dir: String,
    pub errors: Vec<String>,
}

impl DownloadSummary {
    /// Empty summary rooted at the given output directory
    pub fn new(output_dir: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Fold one per-item outcome into this aggregate
    pub fn absorb(&mut self, item: DownloadSummary) {
        self.completed += item.completed;
        self.failed += item.failed;
        self.failed_tracks.extend(item.failed_tracks);
    }
}
