//! Core types for playlist-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// A song to look for on the audio platform
///
/// Only the primary artist is kept; collaborators are dropped when the
/// metadata response is mapped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    /// Track title
    pub name: String,
    /// Name of the first listed artist
    pub artist: String,
}

impl Track {
    /// Create a new track
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
        }
    }

    /// Free-text query submitted to the audio platform
    pub fn search_query(&self) -> String {
        format!("{} {} audio", self.name, self.artist)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.name)
    }
}

/// Identifier of a playlist within the metadata service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Wrap an identifier that is already known to be valid
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract the playlist identifier from a share URL or `spotify:playlist:` URI
    ///
    /// The identifier is the last non-empty path segment; query string and
    /// fragment are ignored. Inputs that are not absolute URLs, or that have
    /// no path segment, are rejected instead of guessed at.
    pub fn from_url(input: &str) -> Result<Self> {
        let input = input.trim();
        let invalid = |reason: &str| Error::InvalidPlaylistUrl {
            url: input.to_string(),
            reason: reason.to_string(),
        };

        if let Some(id) = input.strip_prefix("spotify:playlist:") {
            if id.is_empty() || id.contains(':') {
                return Err(invalid("malformed spotify URI"));
            }
            return Ok(Self(id.to_string()));
        }

        let url = Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
        let id = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .ok_or_else(|| invalid("URL has no path segment"))?;

        Ok(Self(id.to_string()))
    }

    /// Borrow the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PlaylistId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_url(s)
    }
}

/// Random token naming one run's directory and archive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Generate a fresh token
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Name of the run directory, also the stem of the archive file
    pub fn dir_name(&self) -> String {
        format!("downloads_{}", self.0)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of attempting a single track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TrackOutcome {
    /// The track was downloaded and transcoded
    Acquired {
        /// The track that was searched for
        track: Track,
        /// The query submitted to the audio platform
        query: String,
        /// Files that appeared in the run directory for this track
        files: Vec<PathBuf>,
    },
    /// The track could not be acquired
    Failed {
        /// The track that was searched for
        track: Track,
        /// The query submitted to the audio platform
        query: String,
        /// Description of the failure
        error: String,
    },
}

impl TrackOutcome {
    /// Whether this attempt produced audio
    pub fn is_acquired(&self) -> bool {
        matches!(self, TrackOutcome::Acquired { .. })
    }

    /// The query that was submitted
    pub fn query(&self) -> &str {
        match self {
            TrackOutcome::Acquired { query, .. } | TrackOutcome::Failed { query, .. } => query,
        }
    }
}

/// Per-track results of one acquisition pass, in attempt order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionReport {
    /// Directory the tracks were written into
    pub run_dir: PathBuf,
    /// One entry per attempted track
    pub outcomes: Vec<TrackOutcome>,
}

impl AcquisitionReport {
    /// Number of tracks that were attempted
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of tracks that were acquired
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_acquired()).count()
    }

    /// Number of tracks that failed
    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Iterate over the failed attempts
    pub fn failures(&self) -> impl Iterator<Item = &TrackOutcome> {
        self.outcomes.iter().filter(|o| !o.is_acquired())
    }
}

/// Result of a complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Path of the output archive
    pub archive_path: PathBuf,
    /// Number of tracks the playlist contained (after null filtering)
    pub total_tracks: usize,
    /// Number of entries written to the archive
    pub archived_files: usize,
    /// Per-track outcomes
    pub report: AcquisitionReport,
}

/// Progress events emitted by the downloader
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The playlist has been fetched
    TracksFetched {
        /// Number of usable tracks in the playlist
        count: usize,
    },
    /// A track attempt is starting
    TrackStarted {
        /// Zero-based position in the attempted list
        index: usize,
        /// Number of tracks that will be attempted
        total: usize,
        /// Search query
        query: String,
    },
    /// A track was acquired
    TrackAcquired {
        /// Zero-based position in the attempted list
        index: usize,
        /// Search query
        query: String,
        /// Files produced
        files: Vec<PathBuf>,
    },
    /// A track failed; the run continues
    TrackFailed {
        /// Zero-based position in the attempted list
        index: usize,
        /// Search query
        query: String,
        /// Description of the failure
        error: String,
    },
    /// The archive has been written
    Archived {
        /// Archive path
        path: PathBuf,
        /// Number of entries in the archive
        entries: usize,
    },
}
