//! Pasted playlist text parsing
//!
//! Handles the "title / artist / duration" line layout that streaming
//! service web players produce when a playlist is copied out of the
//! browser. Never fails: malformed input just yields fewer tracks.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Track;

/// Bare track duration, e.g. "3:45" or "12:03"
static DURATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap());

/// Leading "12. " style numbering on a title line
static NUMBERING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+").unwrap());

/// Suffix noise appended to titles by remaster reissues
static TITLE_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*-\s*(\d{4}\s+)?remaster(ed)?(\s+\d{4})?(\s+version)?\s*$").unwrap());

/// Quick check that input looks like a pasted playlist: more than one
/// line, with a digit somewhere in the first three characters of the
/// first line (track numbering).
pub fn looks_like_pasted_playlist(text: &str) -> bool {
    if !text.contains('\n') {
        return false;
    }
    let first_line = text.lines().next().unwrap_or("");
    first_line.chars().take(3).any(|c| c.is_ascii_digit())
}

/// Parse pasted playlist text into (artist, title) pairs
///
/// Scans lines with a cursor: a non-blank, non-duration line is a
/// candidate title; the following non-duration line is its artist; a
/// duration line directly after the pair is consumed with it. A title
/// followed immediately by a duration (no artist line) yields no track;
/// that ambiguity is inherent to the pasted format.
pub fn parse_pasted_playlist(text: &str) -> Vec<Track> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut tracks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            i += 1;
            continue;
        }

        let candidate = NUMBERING_RE.replace(line, "");
        if DURATION_RE.is_match(&candidate) {
            i += 1;
            continue;
        }

        match lines.get(i + 1) {
            Some(next) if !next.is_empty() && !DURATION_RE.is_match(next) => {
                let title = TITLE_NOISE_RE.replace(&candidate, "").trim().to_string();
                if !title.is_empty() {
                    tracks.push(Track::new(*next, title));
                }
                i += 2;
                // A trailing duration line belongs to the pair just consumed
                if lines.get(i).map_or(false, |l| DURATION_RE.is_match(l)) {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    tracks
}
