//! Serper.dev search backend (Google results over a JSON API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use super::{SearchError, SearchHit, SearchProvider};

#[derive(Debug, Clone)]
pub struct SerperConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://google.serper.dev".into(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct SerperProvider {
    config: SerperConfig,
    client: reqwest::Client,
}

impl SerperProvider {
    pub fn new(config: SerperConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-API-KEY",
            HeaderValue::from_str(api_key)
                .map_err(|e| SearchError::SerializationError(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn parse_hits(body: &Value, max_results: usize) -> Vec<SearchHit> {
        body.get("organic")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .take(max_results)
                    .map(|item| SearchHit {
                        title: str_field(item, "title"),
                        snippet: str_field(item, "snippet"),
                        url: str_field(item, "link"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn str_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[async_trait]
impl SearchProvider for SerperProvider {
    fn id(&self) -> &str {
        "serper"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredentials)?;

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let response = self
            .client
            .post(url)
            .headers(self.build_headers(api_key)?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SearchError::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(SearchError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| SearchError::SerializationError(e.to_string()))?;
        Ok(Self::parse_hits(&body, max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn provider(base_url: String, api_key: Option<&str>) -> SerperProvider {
        SerperProvider::new(SerperConfig {
            api_key: api_key.map(|s| s.to_string()),
            base_url,
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn test_search_parses_organic_results() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("x-api-key", "k123")
            .with_status(200)
            .with_body(
                r#"{
                "organic": [
                    {"title": "A", "snippet": "first", "link": "https://a.example"},
                    {"title": "B", "snippet": "second", "link": "https://b.example"},
                    {"title": "C", "snippet": "third", "link": "https://c.example"}
                ]
            }"#,
            )
            .create_async()
            .await;

        let hits = provider(server.url(), Some("k123"))
            .search("rust news", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "A");
        assert_eq!(hits[1].url, "https://b.example");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_without_key_is_missing_credentials() {
        let err = provider("http://unused".into(), None)
            .search("anything", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_search_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/search")
            .with_status(403)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = provider(server.url(), Some("k123"))
            .search("anything", 5)
            .await
            .unwrap_err();
        match err {
            SearchError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("quota"));
            }
            other => panic!("Expected ApiError, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_empty_organic_is_ok_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(r#"{"organic": []}"#)
            .create_async()
            .await;

        let hits = provider(server.url(), Some("k123"))
            .search("nothing", 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
