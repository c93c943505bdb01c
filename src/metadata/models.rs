//! Wire types for the Spotify accounts service and Web API
//!
//! Only the fields the fetcher reads are modelled; everything else in the
//! responses is ignored.

use crate::types::Track;
use serde::Deserialize;

/// Response of the client-credentials token exchange
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Error body of the accounts service (`{"error": "...", "error_description": "..."}`)
#[derive(Debug, Deserialize)]
pub(crate) struct AuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Error body of the Web API (`{"error": {"status": 404, "message": "..."}}`)
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

/// One page of `GET /v1/playlists/{id}/tracks`
#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistTracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    /// Absolute URL of the next page, absent on the last page
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// A playlist entry; `track` is null for removed or unavailable tracks
#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistObject {
    #[serde(default)]
    pub name: String,
}

impl PlaylistItem {
    /// Map to a [`Track`], keeping only the first artist
    ///
    /// Returns `None` for null tracks and for tracks without any artist.
    pub(crate) fn into_track(self) -> Option<Track> {
        let track = self.track?;
        let artist = track.artists.into_iter().next()?;
        Some(Track {
            name: track.name,
            artist: artist.name,
        })
    }
}
