//! yt-dlp subprocess client
//!
//! All media resolution is delegated to the external yt-dlp tool: flat
//! (metadata-only) extraction, single-result search, and audio download
//! with mp3 post-processing. The tool's own per-item retry/skip behavior
//! is opaque to this client.

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

use crate::models::Track;

/// Resolver errors
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Resolver binary not found in PATH
    #[error("Media resolver binary not found: {0}")]
    BinaryNotFound(String),

    /// Failed to execute the resolver
    #[error("Failed to execute media resolver: {0}")]
    Execution(String),

    /// Resolver exited with an error
    #[error("Media resolver failed: {0}")]
    Extraction(String),

    /// Failed to parse resolver JSON output
    #[error("Failed to parse media resolver output: {0}")]
    Parse(String),
}

/// One entry of a flat extraction
#[derive(Debug, Clone, Deserialize)]
pub struct FlatEntry {
    pub title: Option<String>,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub uploader: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
}

impl FlatEntry {
    /// Best-effort (artist, title) for this entry
    pub fn as_track(&self) -> Track {
        let artist = self
            .artist
            .as_deref()
            .or(self.uploader.as_deref())
            .unwrap_or("Unknown");
        let title = self
            .track
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("Unknown");
        Track::new(artist, title)
    }

    /// URL to hand back for a full download
    pub fn target_url(&self) -> Option<&str> {
        self.webpage_url.as_deref().or(self.url.as_deref())
    }
}

/// Flat extraction result: a playlist with entries, or a single item
///
/// Unavailable playlist items come back as nulls and are dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatInfo {
    pub title: Option<String>,
    pub entries: Option<Vec<Option<FlatEntry>>>,
}

impl FlatInfo {
    /// Non-null entries, in playlist order
    pub fn valid_entries(&self) -> Vec<&FlatEntry> {
        self.entries
            .as_deref()
            .unwrap_or_default()
            .iter()
            .flatten()
            .collect()
    }

    /// Number of downloadable items this extraction describes
    pub fn item_count(&self) -> usize {
        match &self.entries {
            Some(_) => self.valid_entries().len(),
            None => 1,
        }
    }
}

/// Client for the external media-resolution tool
pub struct MediaResolver {
    binary: String,
}

impl MediaResolver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check that the resolver binary is runnable
    pub async fn probe(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Metadata-only extraction: no media is fetched
    pub async fn extract_flat(&self, target: &str) -> Result<FlatInfo, ResolverError> {
        let stdout = self
            .run(&["-J", "--flat-playlist", "--skip-download", target])
            .await?;
        serde_json::from_slice(&stdout).map_err(|e| ResolverError::Parse(e.to_string()))
    }

    /// Search and return the top result, if any
    pub async fn search_first(&self, query: &str) -> Result<Option<FlatEntry>, ResolverError> {
        let target = format!("ytsearch1:{}", query);
        let info = self.extract_flat(&target).await?;
        Ok(info.entries.unwrap_or_default().into_iter().flatten().next())
    }

    /// Download audio for a URL through the given output template
    pub async fn download(&self, target: &str, output_template: &str) -> Result<(), ResolverError> {
        self.run(&[
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "320K",
            "--ignore-errors",
            "--output",
            output_template,
            target,
        ])
        .await
        .map(|_| ())
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ResolverError> {
        tracing::debug!(binary = %self.binary, ?args, "Running media resolver");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ResolverError::BinaryNotFound(self.binary.clone()),
                _ => ResolverError::Execution(e.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolverError::Extraction(last_error_line(&stderr)));
        }
        Ok(output.stdout)
    }
}

/// The interesting part of resolver stderr is the last non-blank line
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_playlist_parses_and_drops_null_entries() {
        let raw = r#"{
            "title": "Some Playlist",
            "entries": [
                {"title": "Kids", "track": "Kids", "artist": "MGMT", "uploader": "MGMTVEVO", "url": "https://example.com/1", "webpage_url": null},
                null,
                {"title": "Upload Title", "track": null, "artist": null, "uploader": "Some Channel", "url": null, "webpage_url": "https://example.com/2"}
            ]
        }"#;
        let info: FlatInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.item_count(), 2);

        let entries = info.valid_entries();
        assert_eq!(entries[0].as_track(), Track::new("MGMT", "Kids"));
        assert_eq!(entries[0].target_url(), Some("https://example.com/1"));
        // Falls back to uploader/title when track metadata is absent
        assert_eq!(entries[1].as_track(), Track::new("Some Channel", "Upload Title"));
        assert_eq!(entries[1].target_url(), Some("https://example.com/2"));
    }

    #[test]
    fn single_item_counts_as_one() {
        let raw = r#"{"title": "A Video"}"#;
        let info: FlatInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.item_count(), 1);
        assert!(info.valid_entries().is_empty());
    }

    #[test]
    fn missing_metadata_falls_back_to_unknown() {
        let raw = r#"{"title": null, "entries": [{"title": null, "track": null, "artist": null, "uploader": null, "url": null, "webpage_url": null}]}"#;
        let info: FlatInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.valid_entries()[0].as_track(), Track::new("Unknown", "Unknown"));
    }

    #[test]
    fn last_error_line_picks_trailing_content() {
        let stderr = "WARNING: something\n\nERROR: no video found\n\n";
        assert_eq!(last_error_line(stderr), "ERROR: no video found");
        assert_eq!(last_error_line(""), "unknown error");
    }
}
