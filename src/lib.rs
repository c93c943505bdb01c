//! # playlist-dl
//!
//! Download a Spotify playlist as a single ZIP archive of MP3 files.
//!
//! A run goes through three stages, one after the other:
//! - **Fetch** - read every page of the playlist from the Spotify Web API
//!   (client-credentials flow) and keep `(title, primary artist)` per track
//! - **Acquire** - for each track, let yt-dlp search for
//!   `"<title> <artist> audio"`, download the first result and transcode it
//!   to MP3; a failed track is reported and skipped
//! - **Archive** - deflate everything into `downloads_<uuid>.zip` and remove
//!   the run directory
//!
//! ## Quick Start
//!
//! ```no_run
//! use playlist_dl::{Config, Credentials, PlaylistDownloader, PlaylistId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("client-id", "client-secret");
//!     let downloader = PlaylistDownloader::new(Config::default(), &credentials).await?;
//!
//!     let playlist = PlaylistId::from_url("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M")?;
//!     let summary = downloader.run(&playlist).await?;
//!
//!     println!(
//!         "{} of {} tracks in {}",
//!         summary.report.succeeded(),
//!         summary.report.attempted(),
//!         summary.archive_path.display()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Track search, download and transcode
pub mod acquire;
/// ZIP packaging of the run directory
pub mod archive;
/// Configuration types
pub mod config;
/// Credential and playlist URL resolution
pub mod credentials;
/// Stage orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Spotify Web API client
pub mod metadata;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use archive::{ArchiveOutcome, Archiver};
pub use config::{AcquisitionConfig, ArchiveConfig, Config, Credentials, MetadataConfig};
pub use downloader::PlaylistDownloader;
pub use error::{Error, Result, TrackError};
pub use metadata::MetadataClient;
pub use types::{
    AcquisitionReport, Event, PlaylistId, RunId, RunSummary, Track, TrackOutcome,
};
