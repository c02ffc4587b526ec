//! Download orchestration
//!
//! Thin adapter between classified input and the media resolver. Every
//! entry point returns a `DownloadSummary`; per-item failures are
//! recorded and the batch continues. No item is retried: a failed item is
//! recorded once and the loop moves on (best-effort batch policy).

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::{DownloadSummary, FailedTrack, Track};
use crate::services::resolver::MediaResolver;

/// Spotify playlist id, e.g. .../playlist/37i9dQZF1DX0XUsuxWHRQd
static SPOTIFY_PLAYLIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"spotify\.com/playlist/([A-Za-z0-9]+)").unwrap());

/// Download orchestrator
pub struct Downloader {
    resolver: Arc<MediaResolver>,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(resolver: Arc<MediaResolver>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver,
            output_dir: output_dir.into(),
        }
    }

    /// Output template organizing downloads by artist and album
    fn default_template(&self) -> String {
        self.output_dir
            .join("%(artist)s/%(album)s/%(artist)s - %(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    /// Output template scoping downloads under one collection directory
    fn collection_template(&self, collection: &str) -> String {
        self.output_dir
            .join(collection)
            .join("%(artist)s - %(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    /// Download from a direct media URL
    ///
    /// Spotify playlists are resolved to a track list first (metadata
    /// only) and downloaded per track; other Spotify links cannot be
    /// fetched without credentials. For multi-item URLs the resolver does
    /// not expose per-item outcomes within a single call, so a clean
    /// return reports the optimistic `completed = total`.
    pub async fn download_url(&self, url: &str) -> DownloadSummary {
        let mut summary = DownloadSummary::new(self.output_dir.to_string_lossy());

        let is_spotify = url.to_lowercase().contains("spotify.com");
        if is_spotify && url.contains("/playlist/") {
            tracing::info!(url, "Resolving streaming playlist to a track list");

            let tracks: Vec<Track> = match self.resolver.extract_flat(url).await {
                Ok(info) => info.valid_entries().iter().map(|e| e.as_track()).collect(),
                Err(e) => {
                    tracing::warn!(url, error = %e, "Playlist extraction failed");
                    Vec::new()
                }
            };

            if tracks.is_empty() {
                summary
                    .errors
                    .push("Could not extract tracks from Spotify playlist".to_string());
                summary.errors.push(
                    "Make sure the playlist is public, or try a YouTube playlist instead"
                        .to_string(),
                );
                return summary;
            }

            let collection = SPOTIFY_PLAYLIST_RE
                .captures(url)
                .and_then(|c| c.get(1))
                .map(|m| format!("spotify_playlist_{}", m.as_str()))
                .unwrap_or_else(|| "spotify_playlist".to_string());

            return self.download_track_list(&tracks, &collection).await;
        }

        if is_spotify {
            summary
                .errors
                .push("Spotify track/album URLs require API credentials".to_string());
            summary
                .errors
                .push("Try searching for the track instead: 'Artist - Song Name'".to_string());
            return summary;
        }

        // Direct URL: count items first, then hand the whole URL over
        match self.resolver.extract_flat(url).await {
            Ok(info) => {
                summary.total = info.item_count();
                tracing::info!(url, total = summary.total, "Starting download");

                match self.resolver.download(url, &self.default_template()).await {
                    Ok(()) => {
                        summary.completed = summary.total;
                        summary.success = true;
                    }
                    Err(e) => {
                        summary.failed = summary.total;
                        summary.errors.push(format!("Download error: {}", e));
                        tracing::error!(url, error = %e, "Download failed");
                    }
                }
            }
            Err(e) => {
                summary
                    .errors
                    .push(format!("Could not extract info from URL: {}", e));
                tracing::error!(url, error = %e, "Extraction failed");
            }
        }

        summary
    }

    /// Search for a single track and download the first result
    ///
    /// "No search results found" is reported distinctly from a failure in
    /// the download stage.
    pub async fn download_search(&self, query: &str) -> DownloadSummary {
        self.download_search_to(query, None).await
    }

    async fn download_search_to(&self, query: &str, template: Option<&str>) -> DownloadSummary {
        let mut summary = DownloadSummary::new(self.output_dir.to_string_lossy());
        summary.total = 1;

        let search = format!("{} official audio", query);
        tracing::info!(query, "Searching for track");

        let hit = match self.resolver.search_first(&search).await {
            Ok(hit) => hit,
            Err(e) => {
                summary.failed = 1;
                summary.failed_tracks.push(FailedTrack {
                    artist: "Unknown".to_string(),
                    title: query.to_string(),
                    error: e.to_string(),
                });
                summary.errors.push(format!("Search error: {}", e));
                tracing::error!(query, error = %e, "Search failed");
                return summary;
            }
        };

        let target = match hit.as_ref().and_then(|h| h.target_url()) {
            Some(target) => target.to_string(),
            None => {
                summary.failed = 1;
                summary.failed_tracks.push(FailedTrack {
                    artist: "Unknown".to_string(),
                    title: query.to_string(),
                    error: "No search results found".to_string(),
                });
                summary.errors.push(format!("No results found for: {}", query));
                tracing::warn!(query, "No search results");
                return summary;
            }
        };

        let template = template
            .map(str::to_string)
            .unwrap_or_else(|| self.default_template());

        match self.resolver.download(&target, &template).await {
            Ok(()) => {
                summary.completed = 1;
                summary.success = true;
                tracing::info!(query, "Downloaded");
            }
            Err(e) => {
                summary.failed = 1;
                summary.failed_tracks.push(FailedTrack {
                    artist: "Unknown".to_string(),
                    title: query.to_string(),
                    error: e.to_string(),
                });
                summary.errors.push(format!("Download error: {}", e));
                tracing::error!(query, error = %e, "Download failed");
            }
        }

        summary
    }

    /// Download an ordered track list under a named collection directory
    ///
    /// Items missing either field fail without a search; the loop always
    /// continues to the next item. Success means at least one item came
    /// through; the job layer distinguishes a clean batch from a partial
    /// one.
    pub async fn download_track_list(&self, tracks: &[Track], collection: &str) -> DownloadSummary {
        let mut summary =
            DownloadSummary::new(self.output_dir.join(collection).to_string_lossy());
        summary.total = tracks.len();

        let template = self.collection_template(collection);
        tracing::info!(collection, total = tracks.len(), "Downloading track list");

        for (idx, track) in tracks.iter().enumerate() {
            if track.artist.trim().is_empty() || track.title.trim().is_empty() {
                summary.failed += 1;
                summary.failed_tracks.push(FailedTrack {
                    artist: track.artist.clone(),
                    title: track.title.clone(),
                    error: "Missing artist or title".to_string(),
                });
                continue;
            }

            let query = track.search_query();
            tracing::info!("[{}/{}] Searching for: {}", idx + 1, tracks.len(), query);

            let item = self.download_search_to(&query, Some(&template)).await;
            summary.absorb(item);
        }

        summary.success = summary.completed > 0;
        tracing::info!(
            collection,
            completed = summary.completed,
            total = summary.total,
            "Track list download complete"
        );
        summary
    }
}
