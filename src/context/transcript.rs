//! Transcript persistence
//!
//! A transcript is a one-line header followed by a pretty-printed JSON body:
//!
//! ```text
//! colloquy-transcript v1 sha256=<hex digest of the body>
//! {
//!   "turns": [ ... ]
//! }
//! ```
//!
//! The digest covers the exact body bytes, so any edit to the file is
//! reported as corruption rather than silently loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::turn::Turn;
use crate::{Error, Result};

const MAGIC: &str = "colloquy-transcript";
const VERSION: &str = "v1";

#[derive(Serialize)]
struct TranscriptRef<'a> {
    turns: &'a [Turn],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TranscriptBody {
    turns: Vec<Turn>,
}

/// Render turns into transcript text
///
/// # Errors
///
/// Returns error if serialization fails
pub fn encode(turns: &[Turn]) -> Result<String> {
    let body = serde_json::to_string_pretty(&TranscriptRef { turns })?;
    let digest = hex::encode(Sha256::digest(body.as_bytes()));
    Ok(format!("{MAGIC} {VERSION} sha256={digest}\n{body}\n"))
}

/// Parse transcript bytes back into turns, oldest first
///
/// # Errors
///
/// Returns `CorruptTranscript` if the header, digest or body is invalid
pub fn decode(content: &[u8]) -> Result<Vec<Turn>> {
    let text = std::str::from_utf8(content)
        .map_err(|e| corrupt(format!("not valid UTF-8: {e}")))?;

    let (header, rest) = text
        .split_once('\n')
        .ok_or_else(|| corrupt("missing header line"))?;
    let expected = parse_header(header)?;

    let body = rest
        .strip_suffix('\n')
        .ok_or_else(|| corrupt("truncated body"))?;
    let actual = hex::encode(Sha256::digest(body.as_bytes()));
    if actual != expected {
        return Err(corrupt("checksum mismatch"));
    }

    let parsed: TranscriptBody =
        serde_json::from_str(body).map_err(|e| corrupt(format!("invalid body: {e}")))?;

    if parsed
        .turns
        .windows(2)
        .any(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        return Err(corrupt("turns are out of order"));
    }

    Ok(parsed.turns)
}

/// Extract the digest from `colloquy-transcript v1 sha256=<hex>`
fn parse_header(header: &str) -> Result<&str> {
    let mut parts = header.split(' ');

    if parts.next() != Some(MAGIC) {
        return Err(corrupt("not a transcript"));
    }

    match parts.next() {
        Some(VERSION) => {}
        Some(other) => return Err(corrupt(format!("unsupported version {other}"))),
        None => return Err(corrupt("missing version")),
    }

    let digest = parts
        .next()
        .and_then(|p| p.strip_prefix("sha256="))
        .ok_or_else(|| corrupt("missing checksum"))?;

    if parts.next().is_some()
        || digest.len() != 64
        || !digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Err(corrupt("malformed checksum"));
    }

    Ok(digest)
}

fn corrupt(reason: impl Into<String>) -> Error {
    Error::CorruptTranscript(reason.into())
}

/// Write turns to `path`, creating parent directories as needed
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn save(path: &Path, turns: &[Turn]) -> Result<()> {
    let content = encode(turns)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;

    tracing::info!(path = %path.display(), turns = turns.len(), "transcript saved");
    Ok(())
}

/// Read turns from `path`
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and `CorruptTranscript` if its
/// content is invalid
pub fn load(path: &Path) -> Result<Vec<Turn>> {
    let content = std::fs::read(path)?;
    let turns = decode(&content).inspect_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "rejected transcript");
    })?;

    tracing::info!(path = %path.display(), turns = turns.len(), "transcript loaded");
    Ok(turns)
}

/// Fresh transcript path inside `dir`: `conversation_YYYYmmdd_HHMMSS.json`
#[must_use]
pub fn default_transcript_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("conversation_{stamp}.json"))
}
