//! Track acquisition: search, download and transcode each track
//!
//! The acquirer creates a fresh run directory, then walks the track list one
//! track at a time. Each track becomes a [`SearchRequest`] for the configured
//! [`AudioSource`]; its result is recorded as a [`TrackOutcome`] and the loop
//! moves on whether or not the track succeeded. Nothing is retried.
//!
//! ## Usage
//!
//! ```no_run
//! use playlist_dl::acquire::{TrackAcquirer, YtDlpSource};
//! use playlist_dl::config::AcquisitionConfig;
//! use playlist_dl::Track;
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AcquisitionConfig::default();
//!     let source = Arc::new(YtDlpSource::from_config(&config)?);
//!     let (event_tx, _) = broadcast::channel(64);
//!
//!     let acquirer = TrackAcquirer::new(source, config, event_tx);
//!     let report = acquirer
//!         .acquire(&[Track::new("Teardrop", "Massive Attack")])
//!         .await?;
//!     println!("{} of {} acquired", report.succeeded(), report.attempted());
//!     Ok(())
//! }
//! ```

mod traits;
mod ytdlp;

pub use traits::{AudioSource, SearchRequest};
pub use ytdlp::YtDlpSource;

use crate::config::AcquisitionConfig;
use crate::error::Result;
use crate::types::{AcquisitionReport, Event, RunId, Track, TrackOutcome};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sequential per-track downloader
pub struct TrackAcquirer {
    source: Arc<dyn AudioSource>,
    config: AcquisitionConfig,
    event_tx: broadcast::Sender<Event>,
}

impl TrackAcquirer {
    /// Create a new acquirer
    pub fn new(
        source: Arc<dyn AudioSource>,
        config: AcquisitionConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            source,
            config,
            event_tx,
        }
    }

    /// Attempt the first `max_tracks` tracks in a new run directory
    ///
    /// # Errors
    ///
    /// Only creating the run directory can fail the call; individual track
    /// failures end up in the returned report.
    pub async fn acquire(&self, tracks: &[Track]) -> Result<AcquisitionReport> {
        let run_dir = self
            .config
            .output_dir
            .join(RunId::new().dir_name());
        tokio::fs::create_dir_all(&run_dir).await?;

        debug!(?run_dir, "created run directory");

        Ok(self.acquire_into(tracks, run_dir).await)
    }

    /// Attempt the first `max_tracks` tracks in an existing directory
    pub async fn acquire_into(&self, tracks: &[Track], run_dir: PathBuf) -> AcquisitionReport {
        let selected = &tracks[..tracks.len().min(self.config.max_tracks)];
        if selected.len() < tracks.len() {
            info!(
                available = tracks.len(),
                max_tracks = self.config.max_tracks,
                "track list truncated"
            );
        }

        let total = selected.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, track) in selected.iter().enumerate() {
            let query = track.search_query();
            self.event_tx
                .send(Event::TrackStarted {
                    index,
                    total,
                    query: query.clone(),
                })
                .ok();

            let request = SearchRequest {
                query: query.clone(),
                output_dir: run_dir.clone(),
            };

            let before = snapshot(&run_dir);
            let outcome = match self.source.acquire(&request).await {
                Ok(printed) => {
                    let files = new_files(&run_dir, &before, printed);
                    info!(index, total, %query, files = files.len(), "acquired track");
                    self.event_tx
                        .send(Event::TrackAcquired {
                            index,
                            query: query.clone(),
                            files: files.clone(),
                        })
                        .ok();
                    TrackOutcome::Acquired {
                        track: track.clone(),
                        query,
                        files,
                    }
                }
                Err(e) => {
                    warn!(index, total, source = self.source.name(), error = %e, "could not download {}", query);
                    remove_leftovers(&run_dir, &before).await;
                    self.event_tx
                        .send(Event::TrackFailed {
                            index,
                            query: query.clone(),
                            error: e.to_string(),
                        })
                        .ok();
                    TrackOutcome::Failed {
                        track: track.clone(),
                        query,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = AcquisitionReport { run_dir, outcomes };
        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "acquisition finished"
        );
        report
    }
}

/// Every entry below `dir`
fn snapshot(dir: &Path) -> HashSet<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .collect()
}

/// Regular files that appeared since `before`, in path order
///
/// Falls back to the paths the source reported when nothing new appeared,
/// which happens when the output already existed and was not overwritten.
fn new_files(dir: &Path, before: &HashSet<PathBuf>, reported: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = snapshot(dir)
        .into_iter()
        .filter(|path| !before.contains(path) && path.is_file())
        .collect();
    if files.is_empty() {
        return reported;
    }
    files.sort();
    files
}

/// Remove whatever a failed attempt left behind (partial downloads, unconverted streams)
async fn remove_leftovers(dir: &Path, before: &HashSet<PathBuf>) {
    let mut leftovers: Vec<PathBuf> = snapshot(dir)
        .into_iter()
        .filter(|path| !before.contains(path))
        .collect();
    // Deepest first so directories are emptied before they are removed
    leftovers.sort_by_key(|path| std::cmp::Reverse(path.components().count()));

    for path in leftovers {
        let result = if path.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match result {
            Ok(()) => debug!(?path, "removed leftover from failed track"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(?path, error = %e, "failed to remove leftover from failed track"),
        }
    }
}
