//! Playlist metadata from the Spotify Web API
//!
//! [`MetadataClient::authenticate`] performs the OAuth client-credentials
//! exchange once and returns a handle holding the bearer token. The handle is
//! passed explicitly to whoever needs it and dropped with the run; tokens are
//! not refreshed.
//!
//! [`MetadataClient::playlist_tracks`] follows the `next` links of the
//! playlist tracks endpoint until the last page, concatenates every page in
//! order, and maps the non-null entries to [`Track`]s.

mod models;

use crate::config::{Credentials, MetadataConfig};
use crate::error::{Error, Result};
use crate::types::{PlaylistId, Track};
use models::{ApiErrorBody, AuthErrorBody, PlaylistItem, PlaylistTracksPage, TokenResponse};
use reqwest::StatusCode;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

/// Authenticated handle to the metadata service
pub struct MetadataClient {
    http: reqwest::Client,
    api_url: String,
    page_size: u32,
    access_token: String,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl MetadataClient {
    /// Exchange client credentials for an access token
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the accounts service rejects the credentials,
    /// [`Error::Network`] when it cannot be reached.
    pub async fn authenticate(config: &MetadataConfig, credentials: &Credentials) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let token_url = format!("{}/api/token", config.accounts_url.trim_end_matches('/'));

        debug!(%token_url, client_id = %credentials.client_id, "requesting access token");

        let response = http
            .post(&token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(describe_auth_failure(status, &body)));
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(Error::Auth("accounts service returned an empty token".into()));
        }

        info!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "authenticated with metadata service"
        );

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            access_token: token.access_token,
        })
    }

    /// Fetch every track of a playlist, following pagination
    ///
    /// Entries whose track is null (removed from the service) are dropped.
    /// Order is the service's order; duplicates are kept.
    ///
    /// # Errors
    ///
    /// Any failure on any page aborts the whole fetch; no partial list is
    /// returned. A `next` link outside the API origin, or one already
    /// visited, is [`Error::UnexpectedResponse`].
    pub async fn playlist_tracks(&self, playlist: &PlaylistId) -> Result<Vec<Track>> {
        let mut next = Some(self.first_page_url(playlist)?);
        let mut items: Vec<PlaylistItem> = Vec::new();
        let mut visited = HashSet::new();
        let mut pages = 0usize;

        while let Some(page_url) = next {
            if !visited.insert(page_url.clone()) {
                return Err(Error::UnexpectedResponse(format!(
                    "pagination returned to {}",
                    page_url
                )));
            }
            let page = self.fetch_page(&page_url, playlist).await?;
            pages += 1;
            debug!(
                playlist = %playlist,
                page = pages,
                items = page.items.len(),
                total = ?page.total,
                "fetched playlist page"
            );
            items.extend(page.items);
            next = page.next.map(|url| self.check_next(url)).transpose()?;
        }

        let entries = items.len();
        let tracks: Vec<Track> = items
            .into_iter()
            .filter_map(PlaylistItem::into_track)
            .collect();

        info!(
            playlist = %playlist,
            pages,
            entries,
            tracks = tracks.len(),
            skipped = entries - tracks.len(),
            "fetched playlist"
        );

        Ok(tracks)
    }

    fn parsed_api_url(&self) -> Result<Url> {
        Url::parse(&self.api_url)
            .map_err(|e| Error::config("api_url", format!("invalid API URL: {}", e)))
    }

    /// Only follow `next` links on the API's own origin; the bearer token goes with them
    fn check_next(&self, next: String) -> Result<String> {
        let url = Url::parse(&next).map_err(|e| {
            Error::UnexpectedResponse(format!("invalid next page URL {:?}: {}", next, e))
        })?;
        if url.origin() != self.parsed_api_url()?.origin() {
            return Err(Error::UnexpectedResponse(format!(
                "next page URL {} is outside {}",
                next, self.api_url
            )));
        }
        Ok(next)
    }

    fn first_page_url(&self, playlist: &PlaylistId) -> Result<String> {
        let mut url = self.parsed_api_url()?;
        url.path_segments_mut()
            .map_err(|_| Error::config("api_url", "API URL cannot have a path"))?
            .pop_if_empty()
            .extend(["v1", "playlists", playlist.as_str(), "tracks"]);
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", "0")
            .append_pair("additional_types", "track");
        Ok(url.into())
    }

    async fn fetch_page(&self, url: &str, playlist: &PlaylistId) -> Result<PlaylistTracksPage> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = api_error_message(&body).unwrap_or_else(|| status.to_string());
        Err(match status {
            StatusCode::NOT_FOUND => Error::PlaylistNotFound(playlist.to_string()),
            StatusCode::UNAUTHORIZED => Error::Auth(message),
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

fn describe_auth_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<AuthErrorBody>(body) {
        Ok(AuthErrorBody {
            error,
            error_description: Some(description),
        }) => format!("{} ({}): {}", status, error, description),
        Ok(AuthErrorBody { error, .. }) => format!("{} ({})", status, error),
        Err(_) => status.to_string(),
    }
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
