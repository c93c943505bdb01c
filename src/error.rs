//! Error types for playlist-dl
//!
//! Two families of errors exist:
//! - [`Error`] aborts a run (credentials, metadata service, archive, I/O)
//! - [`TrackError`] describes why a single track could not be acquired; it is
//!   recorded in the acquisition report and never stops the run

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for playlist-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for playlist-dl
///
/// Every variant is fatal for the run that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "client_id")
        key: Option<String>,
    },

    /// Client-credentials exchange was rejected by the accounts service
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The playlist URL could not be turned into a playlist identifier
    #[error("invalid playlist URL {url:?}: {reason}")]
    InvalidPlaylistUrl {
        /// The input that was rejected
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The metadata service does not know the playlist
    #[error("playlist not found: {0}")]
    PlaylistNotFound(String),

    /// The metadata service answered with a non-success status
    #[error("metadata service returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// The metadata service sent something that cannot be followed safely
    #[error("unexpected response from metadata service: {0}")]
    UnexpectedResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the output archive failed
    #[error("failed to write archive {path}: {reason}")]
    Archive {
        /// The archive being written
        path: PathBuf,
        /// The reason archiving failed
        reason: String,
    },

    /// Operation not supported (missing binary, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Reasons a single track could not be acquired
#[derive(Debug, Error)]
pub enum TrackError {
    /// The search returned nothing to download
    #[error("no search result")]
    NoResult,

    /// The external tool exited unsuccessfully
    #[error("{tool} exited with {status}: {stderr}")]
    ExternalTool {
        /// Name of the tool (e.g., "yt-dlp")
        tool: String,
        /// Exit status description
        status: String,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The external tool did not finish in time and was killed
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The tool could not be started or its output could not be inspected
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
