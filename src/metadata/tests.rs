use super::*;
use serde_json::{Value, json};
use wiremock::matchers::{basic_auth, bearer_token, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAYLIST_PATH: &str = "/v1/playlists/P1/tracks";

fn config_for(server: &MockServer) -> MetadataConfig {
    MetadataConfig {
        accounts_url: server.uri(),
        api_url: server.uri(),
        ..Default::default()
    }
}

fn credentials() -> Credentials {
    Credentials::new("client-id", "client-secret")
}

fn item(name: &str, artists: &[&str]) -> Value {
    json!({
        "added_at": "2024-05-01T12:00:00Z",
        "track": {
            "name": name,
            "artists": artists.iter().map(|a| json!({"name": a})).collect::<Vec<_>>(),
        }
    })
}

fn null_item() -> Value {
    json!({"added_at": "2024-05-01T12:00:00Z", "track": null})
}

fn page(items: Vec<Value>, next: Option<String>) -> Value {
    json!({"items": items, "next": next, "total": 0})
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(basic_auth("client-id", "client-secret"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn authenticated(server: &MockServer) -> MetadataClient {
    mount_token(server).await;
    MetadataClient::authenticate(&config_for(server), &credentials())
        .await
        .unwrap()
}

#[tokio::test]
async fn single_page_returns_tracks_in_service_order() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(bearer_token("test-token"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "0"))
        .and(query_param("additional_types", "track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![
                item("Karma Police", &["Radiohead"]),
                item("Teardrop", &["Massive Attack"]),
                item("Karma Police", &["Radiohead"]),
            ],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap();

    assert_eq!(
        tracks,
        vec![
            Track::new("Karma Police", "Radiohead"),
            Track::new("Teardrop", "Massive Attack"),
            Track::new("Karma Police", "Radiohead"),
        ],
        "order and duplicates must be preserved"
    );
}

#[tokio::test]
async fn pages_are_concatenated_in_order() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    let second = format!("{}{}?offset=2&limit=2", server.uri(), PLAYLIST_PATH);
    let third = format!("{}{}?offset=4&limit=2", server.uri(), PLAYLIST_PATH);

    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![item("t1", &["a1"]), item("t2", &["a2"])],
            Some(second),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![item("t3", &["a3"]), item("t4", &["a4"])],
            Some(third),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("t5", &["a5"])], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tracks = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap();
    let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["t1", "t2", "t3", "t4", "t5"]);
}

#[tokio::test]
async fn null_tracks_are_excluded() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    let second = format!("{}{}?offset=3", server.uri(), PLAYLIST_PATH);

    // 6 entries in total, 2 of them null
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![item("keep1", &["x"]), null_item(), item("keep2", &["y"])],
            Some(second),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![null_item(), item("keep3", &["z", "featured"]), item("keep4", &["w"])],
            None,
        )))
        .mount(&server)
        .await;

    let tracks = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap();
    assert_eq!(
        tracks,
        vec![
            Track::new("keep1", "x"),
            Track::new("keep2", "y"),
            Track::new("keep3", "z"),
            Track::new("keep4", "w"),
        ]
    );
}

#[tokio::test]
async fn rejected_credentials_are_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Invalid client secret"
        })))
        .mount(&server)
        .await;

    let err = MetadataClient::authenticate(&config_for(&server), &credentials())
        .await
        .unwrap_err();

    match err {
        Error::Auth(message) => {
            assert!(message.contains("invalid_client"), "message: {message}");
            assert!(message.contains("Invalid client secret"), "message: {message}");
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_playlist_is_not_found() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/playlists/MISSING/tracks"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"status": 404, "message": "Resource not found"}
        })))
        .mount(&server)
        .await;

    let err = client
        .playlist_tracks(&PlaylistId::new("MISSING"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PlaylistNotFound(ref id) if id == "MISSING"), "got {err:?}");
}

#[tokio::test]
async fn failure_on_a_later_page_returns_no_partial_result() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    let second = format!("{}{}?offset=1", server.uri(), PLAYLIST_PATH);
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("t1", &["a"])], Some(second))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"status": 429, "message": "API rate limit exceeded"}
        })))
        .mount(&server)
        .await;

    let err = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "API rate limit exceeded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_is_an_auth_error() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .mount(&server)
        .await;

    let err = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap_err();
    assert!(matches!(err, Error::Auth(ref m) if m == "The access token expired"), "got {err:?}");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    // Nothing listens on port 1
    let config = MetadataConfig {
        accounts_url: "http://127.0.0.1:1".into(),
        api_url: "http://127.0.0.1:1".into(),
        ..Default::default()
    };

    let err = MetadataClient::authenticate(&config, &credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn page_size_is_sent_as_limit() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let config = MetadataConfig {
        page_size: 25,
        ..config_for(&server)
    };
    let client = MetadataClient::authenticate(&config, &credentials())
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![], None)))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap();
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn next_page_on_another_host_is_not_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let client = authenticated(&server).await;

    let foreign = format!("{}{}?offset=1", elsewhere.uri(), PLAYLIST_PATH);
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("t1", &["a"])], Some(foreign))),
        )
        .mount(&server)
        .await;

    let err = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap_err();

    assert!(matches!(err, Error::UnexpectedResponse(_)), "got {err:?}");
    assert!(
        elsewhere.received_requests().await.unwrap().is_empty(),
        "the token must not leave the API origin"
    );
}

#[tokio::test]
async fn repeating_next_page_stops_the_fetch() {
    let server = MockServer::start().await;
    let client = authenticated(&server).await;

    let second = format!("{}{}?offset=1", server.uri(), PLAYLIST_PATH);
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![item("t1", &["a"])], Some(second.clone()))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PLAYLIST_PATH))
        .and(query_param("offset", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("t2", &["b"])], Some(second))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client.playlist_tracks(&PlaylistId::new("P1")).await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse(_)), "got {err:?}");
}
