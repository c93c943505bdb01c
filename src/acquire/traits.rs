//! Trait and request type for audio sources

use crate::error::TrackError;
use async_trait::async_trait;
use std::path::PathBuf;

/// One search-and-download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text search query
    pub query: String,
    /// Directory the transcoded file must be written into
    pub output_dir: PathBuf,
}

/// A platform that can turn a search query into a transcoded audio file
///
/// Implementations search, take the first result, download its best audio
/// stream and transcode it into `request.output_dir`, named after the
/// result's own title.
///
/// # Examples
///
/// ```no_run
/// use playlist_dl::acquire::{AudioSource, SearchRequest, YtDlpSource};
/// use playlist_dl::config::AcquisitionConfig;
/// use std::path::PathBuf;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AcquisitionConfig::default();
/// let source = YtDlpSource::from_config(&config)?;
///
/// let files = source
///     .acquire(&SearchRequest {
///         query: "Teardrop Massive Attack audio".into(),
///         output_dir: PathBuf::from("downloads"),
///     })
///     .await?;
/// println!("wrote {:?}", files);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Search for `request.query` and acquire the first result
    ///
    /// # Returns
    ///
    /// The paths of the files written for this request. An empty search
    /// result is reported as [`TrackError::NoResult`], never as an empty list.
    async fn acquire(&self, request: &SearchRequest) -> Result<Vec<PathBuf>, TrackError>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}
