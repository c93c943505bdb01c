//! End-to-end orchestration: fetch → acquire → archive
//!
//! [`PlaylistDownloader`] owns the authenticated metadata handle, the audio
//! source and the archiver for the lifetime of one or more runs. Each stage
//! is also exposed on its own so callers can inspect intermediate results.

use crate::acquire::{AudioSource, TrackAcquirer, YtDlpSource};
use crate::archive::{ArchiveOutcome, Archiver};
use crate::config::{Config, Credentials};
use crate::error::Result;
use crate::metadata::MetadataClient;
use crate::types::{AcquisitionReport, Event, PlaylistId, RunSummary, Track};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Playlist downloader instance
pub struct PlaylistDownloader {
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
    config: Arc<Config>,
    client: MetadataClient,
    acquirer: TrackAcquirer,
    archiver: Archiver,
}

impl PlaylistDownloader {
    /// Create a downloader backed by yt-dlp
    ///
    /// Locates the yt-dlp binary first, then authenticates against the
    /// metadata service.
    ///
    /// # Errors
    ///
    /// Invalid configuration, a missing yt-dlp binary and rejected
    /// credentials are all fatal.
    pub async fn new(config: Config, credentials: &Credentials) -> Result<Self> {
        config.validate()?;

        let source = YtDlpSource::from_config(&config.acquisition)?;
        info!(
            audio_source = source.name(),
            binary = ?source.binary_path(),
            "audio source initialized"
        );

        let client = MetadataClient::authenticate(&config.metadata, credentials).await?;
        Ok(Self::with_parts(config, client, Arc::new(source)))
    }

    /// Assemble a downloader from an existing client and audio source
    pub fn with_parts(config: Config, client: MetadataClient, source: Arc<dyn AudioSource>) -> Self {
        // Large enough for a full 100-track run without lagging subscribers
        let (event_tx, _rx) = broadcast::channel(1000);
        let acquirer = TrackAcquirer::new(source, config.acquisition.clone(), event_tx.clone());
        let archiver = Archiver::new(config.archive.clone());

        Self {
            event_tx,
            config: Arc::new(config),
            client,
            acquirer,
            archiver,
        }
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this downloader was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the playlist's tracks
    pub async fn fetch_tracks(&self, playlist: &PlaylistId) -> Result<Vec<Track>> {
        let tracks = self.client.playlist_tracks(playlist).await?;
        self.event_tx
            .send(Event::TracksFetched {
                count: tracks.len(),
            })
            .ok();
        Ok(tracks)
    }

    /// Acquire up to `max_tracks` of `tracks` into a new run directory
    pub async fn acquire(&self, tracks: &[Track]) -> Result<AcquisitionReport> {
        self.acquirer.acquire(tracks).await
    }

    /// Archive a run directory and clean it up
    pub async fn archive(&self, run_dir: &Path) -> Result<ArchiveOutcome> {
        let outcome = self.archiver.archive(run_dir).await?;
        self.event_tx
            .send(Event::Archived {
                path: outcome.archive_path.clone(),
                entries: outcome.entries.len(),
            })
            .ok();
        Ok(outcome)
    }

    /// Download a whole playlist into a single archive
    ///
    /// Fetch failures abort before anything is written to disk. Track
    /// failures are collected in the summary's report.
    pub async fn run(&self, playlist: &PlaylistId) -> Result<RunSummary> {
        info!(%playlist, "starting playlist download");

        let tracks = self.fetch_tracks(playlist).await?;
        let report = self.acquire(&tracks).await?;
        let archive = self.archive(&report.run_dir).await?;

        info!(
            %playlist,
            archive = ?archive.archive_path,
            acquired = report.succeeded(),
            failed = report.failed(),
            "playlist download complete"
        );

        Ok(RunSummary {
            archive_path: archive.archive_path,
            total_tracks: tracks.len(),
            archived_files: archive.entries.len(),
            report,
        })
    }
}
