//! Audio source backed by the external yt-dlp binary
//!
//! yt-dlp does the search (`ytsearch1:`), the download (best audio format)
//! and, through its ffmpeg post-processor, the transcode to the target codec.

use super::traits::{AudioSource, SearchRequest};
use crate::config::AcquisitionConfig;
use crate::error::{Error, Result, TrackError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Output filename template: the search result's own title
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// [`AudioSource`] that shells out to `yt-dlp`
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    binary_path: PathBuf,
    search_prefix: String,
    format_selector: String,
    audio_format: String,
    audio_quality: String,
    timeout: Duration,
}

impl YtDlpSource {
    /// Create a source using an explicit binary path
    pub fn new(binary_path: PathBuf, config: &AcquisitionConfig) -> Self {
        Self {
            binary_path,
            search_prefix: config.search_prefix.clone(),
            format_selector: config.format_selector.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            timeout: config.track_timeout,
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// `Some(YtDlpSource)` if the binary is found, `None` otherwise.
    pub fn from_path(config: &AcquisitionConfig) -> Option<Self> {
        which::which("yt-dlp")
            .ok()
            .map(|path| Self::new(path, config))
    }

    /// Locate yt-dlp according to the configuration
    ///
    /// An explicit `ytdlp_path` must exist; otherwise PATH is searched when
    /// `search_path` is enabled.
    ///
    /// # Errors
    ///
    /// [`Error::NotSupported`] when no usable binary is found.
    pub fn from_config(config: &AcquisitionConfig) -> Result<Self> {
        if let Some(path) = &config.ytdlp_path {
            if !path.is_file() {
                return Err(Error::NotSupported(format!(
                    "yt-dlp not found at {}",
                    path.display()
                )));
            }
            return Ok(Self::new(path.clone(), config));
        }

        if config.search_path {
            return Self::from_path(config).ok_or_else(|| {
                Error::NotSupported("yt-dlp not found in PATH".to_string())
            });
        }

        Err(Error::NotSupported(
            "no yt-dlp path configured and PATH search disabled".to_string(),
        ))
    }

    /// Path of the binary this source runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    /// Command-line arguments for one request
    pub(crate) fn args(&self, request: &SearchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            format!("{}:{}", self.search_prefix, request.query).into(),
            "--format".into(),
            self.format_selector.clone().into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            self.audio_format.clone().into(),
            "--audio-quality".into(),
            self.audio_quality.clone().into(),
            "--output".into(),
        ];
        args.push(request.output_dir.join(OUTPUT_TEMPLATE).into_os_string());
        args.extend(
            [
                "--no-overwrites",
                "--no-color",
                "--quiet",
                "--no-warnings",
                "--no-progress",
                // --print implies --simulate unless told otherwise
                "--no-simulate",
                "--print",
                "after_move:filepath",
            ]
            .map(OsString::from),
        );
        args
    }
}

#[async_trait]
impl AudioSource for YtDlpSource {
    async fn acquire(&self, request: &SearchRequest) -> std::result::Result<Vec<PathBuf>, TrackError> {
        let args = self.args(request);
        debug!(binary = ?self.binary_path, query = %request.query, "running yt-dlp");

        let child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TrackError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(TrackError::ExternalTool {
                tool: "yt-dlp".to_string(),
                status: output.status.to_string(),
                stderr: error_summary(&output.stderr),
            });
        }

        let files = parse_printed_paths(&output.stdout);
        if files.is_empty() {
            return Err(TrackError::NoResult);
        }
        Ok(files)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Paths printed by `--print after_move:filepath`, one per line
fn parse_printed_paths(stdout: &[u8]) -> Vec<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// The `ERROR:` lines of yt-dlp's stderr, or all of it when there are none
fn error_summary(stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR"))
        .collect();
    if errors.is_empty() {
        stderr.trim().to_string()
    } else {
        errors.join("; ")
    }
}
