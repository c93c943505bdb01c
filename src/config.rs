//! Configuration types for playlist-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Metadata service (Spotify) endpoints and HTTP behavior
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Accounts service base URL used for the client-credentials exchange
    /// (default: "https://accounts.spotify.com")
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,

    /// Web API base URL (default: "https://api.spotify.com")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Number of playlist items requested per page (default: 100, the service maximum)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            accounts_url: default_accounts_url(),
            api_url: default_api_url(),
            page_size: default_page_size(),
            timeout: default_request_timeout(),
        }
    }
}

/// Track acquisition behavior (limits, output location, yt-dlp options)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Maximum number of tracks attempted per run (default: 100)
    #[serde(default = "default_max_tracks")]
    pub max_tracks: usize,

    /// Parent directory for the run directory and the output archive (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Search prefix understood by yt-dlp (default: "ytsearch1", first result only)
    #[serde(default = "default_search_prefix")]
    pub search_prefix: String,

    /// yt-dlp format selector (default: "bestaudio/best")
    #[serde(default = "default_format_selector")]
    pub format_selector: String,

    /// Target audio codec for the ffmpeg post-processor (default: "mp3")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality (default: "192K")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Time allowed for a single track before yt-dlp is killed (default: 10 minutes)
    #[serde(default = "default_track_timeout", with = "duration_serde")]
    pub track_timeout: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_tracks: default_max_tracks(),
            output_dir: default_output_dir(),
            search_prefix: default_search_prefix(),
            format_selector: default_format_selector(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            ytdlp_path: None,
            search_path: true,
            track_timeout: default_track_timeout(),
        }
    }
}

/// Archive and cleanup behavior
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Keep the run directory after the archive has been written (default: false)
    #[serde(default)]
    pub keep_run_dir: bool,
}

/// Main configuration for [`PlaylistDownloader`](crate::PlaylistDownloader)
///
/// Sub-configs are nested in the JSON representation:
///
/// ```json
/// {
///   "metadata": { "page_size": 50 },
///   "acquisition": { "max_tracks": 20, "output_dir": "/tmp/playlists" },
///   "archive": { "keep_run_dir": false }
/// }
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Metadata service endpoints
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Search, download and transcode settings
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Archive settings
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                "config",
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that can never produce a useful run
    pub fn validate(&self) -> Result<()> {
        if self.acquisition.max_tracks == 0 {
            return Err(Error::config("max_tracks", "max_tracks must be at least 1"));
        }
        if self.metadata.page_size == 0 || self.metadata.page_size > 100 {
            return Err(Error::config(
                "page_size",
                "page_size must be between 1 and 100",
            ));
        }
        if self.acquisition.search_prefix.trim().is_empty() {
            return Err(Error::config("search_prefix", "search_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Client credentials for the metadata service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Application client ID
    pub client_id: String,
    /// Application client secret
    pub client_secret: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// Keep the secret out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

fn default_accounts_url() -> String {
    "https://accounts.spotify.com".into()
}

fn default_api_url() -> String {
    "https://api.spotify.com".into()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_tracks() -> usize {
    100
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_search_prefix() -> String {
    "ytsearch1".into()
}

fn default_format_selector() -> String {
    "bestaudio/best".into()
}

fn default_audio_format() -> String {
    "mp3".into()
}

fn default_audio_quality() -> String {
    "192K".into()
}

fn default_true() -> bool {
    true
}

fn default_track_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
