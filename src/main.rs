//! Command-line entry point: download a Spotify playlist as a ZIP of MP3s.

use clap::Parser;
use playlist_dl::credentials::{ProcessEnv, TerminalPrompter, resolve_credentials, resolve_playlist};
use playlist_dl::{Config, Event, PlaylistDownloader, Result};
use std::path::PathBuf;
use std::process;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

/// Download every track of a Spotify playlist via yt-dlp and pack them into a ZIP archive.
#[derive(Debug, Parser)]
#[command(name = "playlist-dl", version, about)]
struct Cli {
    /// Playlist URL (prompted for when omitted)
    #[arg(long)]
    url: Option<String>,

    /// Maximum number of tracks to download
    #[arg(long)]
    max_tracks: Option<usize>,

    /// Directory receiving the run directory and the archive
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path to the yt-dlp executable
    #[arg(long, env = "YTDLP_PATH")]
    ytdlp_path: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep the run directory after archiving
    #[arg(long)]
    keep_run_dir: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Configuration file (or defaults) overridden by command-line flags
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(max_tracks) = self.max_tracks {
            config.acquisition.max_tracks = max_tracks;
        }
        if let Some(output_dir) = &self.output_dir {
            config.acquisition.output_dir = output_dir.clone();
        }
        if let Some(ytdlp_path) = &self.ytdlp_path {
            config.acquisition.ytdlp_path = Some(ytdlp_path.clone());
        }
        if self.keep_run_dir {
            config.archive.keep_run_dir = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::debug!(error = ?e, "run failed");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;

    let mut prompter = TerminalPrompter;
    let resolved = resolve_credentials(&ProcessEnv, &mut prompter)?;
    let playlist = resolve_playlist(cli.url.as_deref(), &mut prompter)?;

    tracing::debug!(
        client_id = ?resolved.client_id_source,
        client_secret = ?resolved.client_secret_source,
        "resolved credentials"
    );

    let downloader = PlaylistDownloader::new(config, &resolved.credentials).await?;
    let settings = downloader.config();
    tracing::info!(
        %playlist,
        max_tracks = settings.acquisition.max_tracks,
        output_dir = ?settings.acquisition.output_dir,
        "downloading playlist"
    );

    let printer = tokio::spawn(forward_events(downloader.subscribe(), print_event));

    let summary = downloader.run(&playlist).await?;
    drop(downloader);
    printer.await.ok();

    for failure in summary.report.failures() {
        tracing::debug!(query = failure.query(), "track missing from archive");
    }
    println!(
        "{} of {} tracks downloaded ({} failed)",
        summary.report.succeeded(),
        summary.report.attempted(),
        summary.report.failed()
    );
    println!(
        "Playlist downloaded successfully: {}",
        summary.archive_path.display()
    );
    Ok(())
}

/// Hand every event to `handle` until the channel closes
///
/// Falling behind only loses the skipped events; the loop keeps going.
async fn forward_events(mut events: broadcast::Receiver<Event>, mut handle: impl FnMut(&Event)) {
    loop {
        match events.recv().await {
            Ok(event) => handle(&event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress output fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &Event) {
    match event {
        Event::TracksFetched { count } => println!("Found {count} tracks"),
        Event::TrackStarted { index, total, query } => {
            println!("[{}/{}] {}", index + 1, total, query)
        }
        Event::TrackFailed { query, error, .. } => {
            println!("Could not download {query}: {error}")
        }
        Event::TrackAcquired { .. } | Event::Archived { .. } => {}
    }
}
