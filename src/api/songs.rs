//! Currently selected songs, as reported by the playlist backend.

use serde::Deserialize;
use tracing::info;

use crate::api::client::BackendClient;
use crate::config::ApiConfig;
use crate::error::AppError;

/// Endpoint returning the current selection.
pub const CURRENT_SONGS_PATH: &str = "/api/current-songs";

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// The backend answers either with `{"addedSongs": [...]}` or with the bare
/// array served by its `/api/songs` route.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSongsResponse {
    Bare(Vec<String>),
    Wrapped(WireAddedSongs),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAddedSongs {
    #[serde(default)]
    added_songs: Option<Vec<String>>,
}

impl WireSongsResponse {
    fn into_songs(self) -> Vec<String> {
        match self {
            WireSongsResponse::Bare(songs) => songs,
            WireSongsResponse::Wrapped(wrapped) => wrapped.added_songs.unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SongsApi
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only access to the backend's song selection.
///
/// One request per call: no retry, no auth.
#[derive(Clone)]
pub struct SongsApi {
    client: BackendClient,
}

impl SongsApi {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, AppError> {
        Ok(Self::new(BackendClient::new(config)?))
    }

    /// Fetches the currently selected songs.
    ///
    /// A response without an `addedSongs` field is an empty selection.
    pub async fn current_songs(&self) -> Result<Vec<String>, AppError> {
        let response: WireSongsResponse = self.client.get_json(CURRENT_SONGS_PATH).await?;
        let songs = response.into_songs();
        info!("[API] Backend reports {} selected songs", songs.len());
        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_with_body(body: ResponseTemplate) -> (MockServer, SongsApi) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CURRENT_SONGS_PATH))
            .respond_with(body)
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ApiConfig::default().base_url(mock_server.uri());
        let api = SongsApi::from_config(&config).expect("api");
        (mock_server, api)
    }

    #[tokio::test]
    async fn test_added_songs_are_returned_in_order() {
        let (_server, api) = api_with_body(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "addedSongs": ["X", "Y"] })),
        )
        .await;

        let songs = api.current_songs().await.expect("request");
        assert_eq!(songs, vec!["X", "Y"]);
    }

    #[tokio::test]
    async fn test_missing_field_is_empty_list() {
        let (_server, api) = api_with_body(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })),
        )
        .await;

        let songs = api.current_songs().await.expect("request");
        assert!(songs.is_empty());
    }

    #[tokio::test]
    async fn test_null_field_is_empty_list() {
        let (_server, api) = api_with_body(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "addedSongs": null })),
        )
        .await;

        assert!(api.current_songs().await.expect("request").is_empty());
    }

    #[tokio::test]
    async fn test_bare_array_is_accepted() {
        let (_server, api) = api_with_body(
            ResponseTemplate::new(200).set_body_json(serde_json::json!(["Help!"])),
        )
        .await;

        assert_eq!(api.current_songs().await.expect("request"), vec!["Help!"]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let (_server, api) =
            api_with_body(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        match api.current_songs().await {
            Err(AppError::InvalidResponse(_)) => {}
            other => panic!("Expected InvalidResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_shape_is_invalid_response() {
        let (_server, api) = api_with_body(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "addedSongs": [1, 2] })),
        )
        .await;

        assert!(matches!(
            api.current_songs().await,
            Err(AppError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_http_status() {
        let (_server, api) = api_with_body(ResponseTemplate::new(404)).await;

        match api.current_songs().await {
            Err(AppError::HttpStatus { status }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus, got {:?}", other),
        }
    }
}
