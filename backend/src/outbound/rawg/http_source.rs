//! Reqwest-backed RAWG game feed adapter.
//!
//! This adapter owns transport details only: query construction, timeout and
//! HTTP error mapping, and JSON decoding into feed games.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::RawgGamesResponseDto;
use crate::domain::ports::{FeedPage, GameFeed, GameFeedError};

/// Public RAWG games listing.
pub const RAWG_DEFAULT_ENDPOINT: &str = "https://api.rawg.io/api/games";
const DEFAULT_USER_AGENT: &str = "storefront-backend-catalog-sync/0.1";

/// Game feed adapter that pages through one RAWG endpoint.
pub struct RawgHttpSource {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl RawgHttpSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let source = RawgHttpSource::new(endpoint, api_key, Duration::from_secs(10))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    fn page_url(&self, page: u32, page_size: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("page_size", &page_size.to_string())
            .append_pair("page", &page.to_string());
        url
    }
}

#[async_trait]
impl GameFeed for RawgHttpSource {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<FeedPage, GameFeedError> {
        if page == 0 || page_size == 0 {
            return Err(GameFeedError::invalid_request(
                "page and page_size must be positive",
            ));
        }

        let response = self
            .client
            .get(self.page_url(page, page_size))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let feed_page = parse_page(body.as_ref())?;
        debug!(page, games = feed_page.games.len(), has_more = feed_page.has_more, "fetched RAWG page");
        Ok(feed_page)
    }
}

fn parse_page(body: &[u8]) -> Result<FeedPage, GameFeedError> {
    let decoded: RawgGamesResponseDto = serde_json::from_slice(body).map_err(|error| {
        GameFeedError::decode(format!("invalid RAWG JSON payload: {error}"))
    })?;
    Ok(decoded.into_feed_page())
}

fn map_transport_error(error: reqwest::Error) -> GameFeedError {
    // reqwest includes the URL in its messages; strip it so the API key stays out of logs.
    let error = error.without_url();
    if error.is_timeout() {
        GameFeedError::timeout(error.to_string())
    } else {
        GameFeedError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GameFeedError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => GameFeedError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GameFeedError::timeout(message),
        _ if status.is_client_error() => GameFeedError::invalid_request(message),
        _ => GameFeedError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network RAWG mapping helpers.

    use super::*;
    use rstest::rstest;

    #[test]
    fn page_url_carries_key_and_paging() {
        let source = RawgHttpSource::new(
            Url::parse(RAWG_DEFAULT_ENDPOINT).expect("endpoint"),
            "secret",
            Duration::from_secs(5),
        )
        .expect("client builds");

        let url = source.page_url(3, 40);
        assert_eq!(
            url.query(),
            Some("key=secret&page_size=40&page=3"),
            "query should list key, page_size, then page"
        );
    }

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, "RateLimited")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, "InvalidRequest")]
    #[case::server_error(StatusCode::BAD_GATEWAY, "Transport")]
    fn maps_http_statuses_to_feed_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"error\":\"nope\"}");
        let matched = match expected {
            "RateLimited" => matches!(error, GameFeedError::RateLimited { .. }),
            "Timeout" => matches!(error, GameFeedError::Timeout { .. }),
            "InvalidRequest" => matches!(error, GameFeedError::InvalidRequest { .. }),
            "Transport" => matches!(error, GameFeedError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }

    #[test]
    fn parses_rawg_page_into_feed_games() {
        let body = r#"{
            "count": 2,
            "next": "https://api.rawg.io/api/games?page=2",
            "results": [
                {
                    "id": 3498,
                    "name": "Grand Theft Auto V",
                    "background_image": "https://media.rawg.io/gta.jpg",
                    "rating": 4.47,
                    "genres": [{ "id": 4, "name": "Action" }],
                    "platforms": [{ "platform": { "id": 4, "name": "PC" } }]
                },
                {
                    "id": 22,
                    "name": "Sparse",
                    "background_image": null,
                    "rating": null,
                    "genres": null,
                    "platforms": null
                }
            ]
        }"#;

        let page = parse_page(body.as_bytes()).expect("JSON should decode");
        assert!(page.has_more);
        assert_eq!(page.games.len(), 2);
        assert_eq!(page.games[0].genres, vec!["Action".to_owned()]);
        assert_eq!(page.games[0].platforms, vec!["PC".to_owned()]);
        assert_eq!(page.games[1].image_url, None);
        assert_eq!(page.games[1].rating, 0.0);
    }

    #[test]
    fn last_page_has_no_successor() {
        let page = parse_page(br#"{"next": null, "results": []}"#).expect("decodes");
        assert!(!page.has_more);
        assert!(page.games.is_empty());
    }

    #[test]
    fn rejects_malformed_payloads() {
        let error = parse_page(b"<html>").expect_err("decode should fail");
        assert!(matches!(error, GameFeedError::Decode { .. }));
    }

    #[test]
    fn long_bodies_are_truncated_in_previews() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }
}
