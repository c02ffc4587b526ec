//! Vibe playlist generation client
//!
//! Talks to a local Ollama-compatible generation backend: one synchronous
//! prompt-completion call plus a lightweight liveness probe so callers
//! can fail fast with a clear message before starting generation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::Track;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reply lines that are commentary rather than CSV data
const NOISE_MARKERS: &[&str] = &["artist,title", "here", "based on", "playlist", "---", "```"];

/// Generation client errors
#[derive(Debug, Error)]
pub enum VibeError {
    /// Could not build the HTTP client
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Backend not reachable
    #[error("Generation backend unreachable: {0}")]
    Unreachable(String),

    /// Generation call exceeded its timeout
    #[error("Generation request timed out")]
    Timeout,

    /// Backend answered with a non-success status
    #[error("Generation backend returned HTTP {0}")]
    Status(u16),

    /// Reply body could not be decoded
    #[error("Failed to decode generation reply: {0}")]
    Decode(String),

    /// Backend answered with an empty reply
    #[error("Generation backend returned an empty reply")]
    EmptyReply,

    /// Reply contained no parseable artist,title lines
    #[error("No tracks could be parsed from the generated reply")]
    NoTracks,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for the playlist generation backend
pub struct VibeClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl VibeClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, VibeError> {
        let http = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .map_err(|e| VibeError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Generate up to `count` (artist, title) pairs for a vibe description
    ///
    /// The result may be shorter than `count`, never longer.
    pub async fn generate(&self, vibe: &str, count: usize) -> Result<Vec<Track>, VibeError> {
        let prompt = build_prompt(vibe, count);
        tracing::info!(vibe = %vibe, count, "Generating playlist from vibe");

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt: &prompt,
                stream: false,
            })
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VibeError::Timeout
                } else {
                    VibeError::Unreachable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(VibeError::Status(response.status().as_u16()));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VibeError::Decode(e.to_string()))?;
        if reply.response.trim().is_empty() {
            return Err(VibeError::EmptyReply);
        }

        let tracks = parse_reply(&reply.response, count);
        if tracks.is_empty() {
            return Err(VibeError::NoTracks);
        }

        tracing::info!(generated = tracks.len(), "Parsed generated playlist");
        Ok(tracks)
    }

    /// Liveness probe for the fail-fast path
    pub async fn probe(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Fixed prompt instructing the backend to emit bare CSV lines
fn build_prompt(vibe: &str, count: usize) -> String {
    format!(
        "You are a music supervisor creating playlists. Generate a playlist of exactly {} songs based on this description: \"{}\"\n\n\
         Output ONLY valid CSV format with exactly two columns: artist,title\n\
         No headers, no explanations, no numbering, no extra text.\n\
         Each line should be: Artist Name,Song Title\n\n\
         Example format:\n\
         MGMT,Kids\n\
         Passion Pit,Sleepyhead\n\n\
         Now generate the playlist:",
        count, vibe
    )
}

/// Parse the generated reply into tracks
///
/// Drops commentary lines, strips leading numbering/bullets, splits each
/// remaining line on the first comma and keeps only pairs with both
/// fields present. Never returns more than `max` tracks.
fn parse_reply(text: &str, max: usize) -> Vec<Track> {
    let mut tracks = Vec::new();
    if max == 0 {
        return tracks;
    }

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if NOISE_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        if !line.contains(',') {
            continue;
        }

        let line = line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == ' ');
        if let Some((artist, title)) = line.split_once(',') {
            let artist = artist.trim();
            let title = title.trim();
            if !artist.is_empty() && !title.is_empty() {
                tracks.push(Track::new(artist, title));
                if tracks.len() == max {
                    break;
                }
            }
        }
    }

    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commentary_and_fences_are_dropped() {
        let reply = "Here is your playlist:\n```\nMGMT,Kids\nPassion Pit,Sleepyhead\n---\n```";
        let tracks = parse_reply(reply, 10);
        assert_eq!(
            tracks,
            vec![
                Track::new("MGMT", "Kids"),
                Track::new("Passion Pit", "Sleepyhead"),
            ]
        );
    }

    #[test]
    fn numbering_and_bullets_are_stripped() {
        let tracks = parse_reply("1. MGMT,Kids\n- Passion Pit,Sleepyhead", 10);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0], Track::new("MGMT", "Kids"));
    }

    #[test]
    fn lines_without_a_comma_are_dropped() {
        assert!(parse_reply("just some prose\nmore prose", 10).is_empty());
    }

    #[test]
    fn half_empty_pairs_are_dropped() {
        assert!(parse_reply(",Kids\nMGMT,", 10).is_empty());
    }

    #[test]
    fn result_is_truncated_to_max() {
        let reply = "A,1\nB,2\nC,3\nD,4\nE,5";
        assert_eq!(parse_reply(reply, 3).len(), 3);
        assert!(parse_reply(reply, 0).is_empty());
    }

    #[test]
    fn prompt_carries_count_and_vibe() {
        let prompt = build_prompt("late night coding", 12);
        assert!(prompt.contains("exactly 12 songs"));
        assert!(prompt.contains("\"late night coding\""));
    }
}
