//! Input classification
//!
//! Decides what a submitted line of text is: a media URL, a streaming
//! service link, an "Artist - Title" search, pasted playlist text, or a
//! free-text vibe description. Pure and total: every input maps to a
//! category, no I/O, no failure path.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::playlist_text::looks_like_pasted_playlist;

/// Classifier output categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    YoutubeVideo,
    YoutubePlaylist,
    SpotifyTrack,
    SpotifyAlbum,
    SpotifyPlaylist,
    SearchQuery,
    VibeDescription,
    PastedPlaylist,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputKind::YoutubeVideo => "youtube_video",
            InputKind::YoutubePlaylist => "youtube_playlist",
            InputKind::SpotifyTrack => "spotify_track",
            InputKind::SpotifyAlbum => "spotify_album",
            InputKind::SpotifyPlaylist => "spotify_playlist",
            InputKind::SearchQuery => "search_query",
            InputKind::VibeDescription => "vibe_description",
            InputKind::PastedPlaylist => "pasted_playlist",
        };
        f.write_str(name)
    }
}

/// Mood and occasion words that mark a vibe description
const VIBE_KEYWORDS: &[&str] = &[
    "music for",
    "playlist",
    "vibe",
    "mood",
    "feeling",
    "upbeat",
    "chill",
    "relaxing",
    "energetic",
    "party",
    "workout",
    "study",
    "focus",
    "sleep",
    "background",
];

/// Classify raw user input
///
/// Returns the category and the trimmed input. Rules are ordered; the
/// first match wins.
pub fn classify(input: &str) -> (InputKind, String) {
    let text = input.trim();

    // Pasted playlist text is recognized before anything else so a paste
    // is never misread as a vibe description
    if looks_like_pasted_playlist(text) {
        return (InputKind::PastedPlaylist, text.to_string());
    }

    if let Some(kind) = classify_url(text) {
        return (kind, text.to_string());
    }

    // "Artist - Song": exactly one separator, two non-empty halves
    let parts: Vec<&str> = text.split(" - ").collect();
    if parts.len() == 2 && parts.iter().all(|p| !p.trim().is_empty()) {
        return (InputKind::SearchQuery, text.to_string());
    }

    let lower = text.to_lowercase();
    if VIBE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return (InputKind::VibeDescription, text.to_string());
    }

    // Short text without mood words reads like a search
    if text.split_whitespace().count() <= 5 {
        return (InputKind::SearchQuery, text.to_string());
    }

    (InputKind::VibeDescription, text.to_string())
}

/// URL branch: anything with both a scheme and a host maps to a
/// URL-derived category. Unrecognized hosts are routed like video-sharing
/// links, since the media resolver accepts arbitrary site URLs.
fn classify_url(text: &str) -> Option<InputKind> {
    let parsed = Url::parse(text).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    if host.contains("spotify.com") {
        return Some(if text.contains("/playlist/") {
            InputKind::SpotifyPlaylist
        } else if text.contains("/album/") {
            InputKind::SpotifyAlbum
        } else {
            // Ambiguous Spotify paths default to a single track
            InputKind::SpotifyTrack
        });
    }

    if text.contains("playlist") || text.contains("list=") {
        Some(InputKind::YoutubePlaylist)
    } else {
        Some(InputKind::YoutubeVideo)
    }
}
