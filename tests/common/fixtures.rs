//! Mock Spotify endpoints and a stand-in yt-dlp executable

use playlist_dl::config::{AcquisitionConfig, ArchiveConfig, MetadataConfig};
use playlist_dl::Config;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Playlist id served by [`spotify_with_pages`]
pub const PLAYLIST_ID: &str = "37i9dQZF1DXcBWIGoYBM5M";

/// One playlist item with a single artist
pub fn item(name: &str, artist: &str) -> Value {
    json!({
        "track": {
            "name": name,
            "artists": [{"name": artist}],
            "album": {"name": "Unused"}
        }
    })
}

/// A playlist item whose track was removed from the catalogue
pub fn removed_item() -> Value {
    json!({"track": null})
}

/// Start a mock Spotify that accepts any client credentials and serves
/// `pages` for [`PLAYLIST_ID`], linked through `next`
pub async fn spotify_with_pages(pages: Vec<Vec<Value>>) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "integration-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let tracks_path = format!("/v1/playlists/{PLAYLIST_ID}/tracks");
    let total: usize = pages.iter().map(Vec::len).sum();
    let page_count = pages.len();
    for (index, items) in pages.into_iter().enumerate() {
        let next = if index + 1 < page_count {
            json!(format!("{}{}?page={}", server.uri(), tracks_path, index + 1))
        } else {
            Value::Null
        };
        let body = json!({"items": items, "next": next, "total": total});

        let mock = Mock::given(method("GET")).and(path(tracks_path.as_str()));
        let mock = if index == 0 {
            mock.and(query_param("offset", "0"))
        } else {
            mock.and(query_param("page", index.to_string()))
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    server
}

/// Configuration pointing at the mock server and a fake yt-dlp
pub fn config_for(server: &MockServer, output_dir: &Path, ytdlp: &Path) -> Config {
    Config {
        metadata: MetadataConfig {
            accounts_url: server.uri(),
            api_url: server.uri(),
            ..Default::default()
        },
        acquisition: AcquisitionConfig {
            output_dir: output_dir.to_path_buf(),
            ytdlp_path: Some(ytdlp.to_path_buf()),
            search_path: false,
            ..Default::default()
        },
        archive: ArchiveConfig::default(),
    }
}

/// Write an executable shell script standing in for yt-dlp
///
/// The script appends each search query to `log`, then:
/// - queries containing `NOTFOUND` exit 0 without printing a path
/// - queries containing `BROKEN` exit 1 with an `ERROR:` line on stderr
/// - queries containing `POSTFAIL` leave the unconverted `<title>.webm`
///   behind and exit 1, like a failed ffmpeg post-processing step
/// - queries containing `STALL` leave `<title>.webm.part` behind and hang
/// - anything else writes `<title>.mp3` next to the `--output` template,
///   with `mp3:<query>` as content, and prints its path
#[cfg(unix)]
pub fn fake_ytdlp(dir: &Path, log: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
query=""
output=""
while [ $# -gt 0 ]; do
  case "$1" in
    ytsearch1:*) query="${{1#ytsearch1:}}" ;;
    --output) shift; output="$1" ;;
  esac
  shift
done
printf '%s\n' "$query" >> '{log}'
base="$(dirname "$output")/${{query% audio}}"
case "$query" in
  *NOTFOUND*) exit 0 ;;
  *BROKEN*) echo "ERROR: [youtube] video unavailable" >&2; exit 1 ;;
  *POSTFAIL*)
    printf 'raw' > "$base.webm"
    echo "ERROR: Postprocessing: audio conversion failed" >&2
    exit 1 ;;
  *STALL*)
    printf 'part' > "$base.webm.part"
    exec sleep 30 ;;
esac
file="$base.mp3"
printf 'mp3:%s' "$query" > "$file"
printf '%s\n' "$file"
"#,
        log = log.display()
    );

    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Queries the fake yt-dlp received, in order
pub fn logged_queries(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
