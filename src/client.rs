use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{Author, ItemId, Story};

/// Everything that can go wrong while loading the page data. Any of these
/// settles the session into the error state.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no author record for {0}")]
    MissingAuthor(String),

    #[error("cancelled")]
    Cancelled,
}

/// Thin client over the read-only Hacker News API.
pub struct HnClient {
    client: Client,
    base_url: String,
}

impl HnClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("TenNews/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn top_story_ids(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ItemId>, FetchError> {
        self.get_json(format!("{}/topstories.json", self.base_url), cancel)
            .await
    }

    pub async fn story(&self, id: ItemId, cancel: &CancellationToken) -> Result<Story, FetchError> {
        self.get_json(format!("{}/item/{}.json", self.base_url, id), cancel)
            .await
    }

    pub async fn author(&self, id: &str, cancel: &CancellationToken) -> Result<Author, FetchError> {
        self.get_json(format!("{}/user/{}.json", self.base_url, id), cancel)
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.fetch(&url) => result,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HnClient {
        HnClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HnClient::new("http://example.com/v0/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://example.com/v0");
    }

    #[tokio::test]
    async fn test_top_story_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([3, 1, 2])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let ids = client
            .top_story_ids(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_story_and_author() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/8863.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 8863, "title": "Dropbox", "score": "104", "time": 0, "by": "dhouston"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/dhouston.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "dhouston", "karma": 42})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cancel = CancellationToken::new();

        let story = client.story(8863, &cancel).await.unwrap();
        assert_eq!(story.score, 104.0);

        let author = client.author(&story.by, &cancel).await.unwrap();
        assert_eq!(author.karma, 42);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/1.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.story(1, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .top_story_ids(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_deleted_item_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/2.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.story(2, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        // Nothing listens on port 9 locally.
        let client = HnClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client
            .top_story_ids(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client.top_story_ids(&cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_while_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([1]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = client.top_story_ids(&cancel).await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
