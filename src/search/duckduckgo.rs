//! DuckDuckGo Instant Answer backend, used only as the fallback.
//!
//! The Instant Answer API is keyless but sparse: it returns an abstract plus
//! related topics rather than full web results, so hit quality is below
//! Serper's. Good enough to keep the search mode alive when the primary
//! backend is down or unconfigured.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{SearchError, SearchHit, SearchProvider};

pub struct DuckDuckGoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url("https://api.duckduckgo.com".into(), timeout)
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { base_url, client }
    }

    fn parse_hits(body: &Value, max_results: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        let abstract_text = body
            .get("AbstractText")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if !abstract_text.is_empty() {
            hits.push(SearchHit {
                title: body
                    .get("Heading")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                snippet: abstract_text.to_string(),
                url: body
                    .get("AbstractURL")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            });
        }

        if let Some(topics) = body.get("RelatedTopics").and_then(|v| v.as_array()) {
            for topic in topics {
                // Category entries nest their topics one level down.
                let entries = match topic.get("Topics").and_then(|v| v.as_array()) {
                    Some(nested) => nested.iter().collect::<Vec<_>>(),
                    None => vec![topic],
                };
                for entry in entries {
                    let text = entry.get("Text").and_then(|v| v.as_str()).unwrap_or("");
                    let url = entry
                        .get("FirstURL")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    if text.is_empty() || url.is_empty() {
                        continue;
                    }
                    hits.push(SearchHit {
                        title: text.chars().take(80).collect(),
                        snippet: text.to_string(),
                        url: url.to_string(),
                    });
                    if hits.len() >= max_results {
                        return hits;
                    }
                }
            }
        }

        hits.truncate(max_results);
        hits
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn id(&self) -> &str {
        "duckduckgo"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
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

    #[tokio::test]
    async fn test_search_parses_abstract_and_topics() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                "Heading": "Rust",
                "AbstractText": "Rust is a systems programming language.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
                "RelatedTopics": [
                    {"Text": "Cargo - the Rust package manager", "FirstURL": "https://ddg.example/cargo"},
                    {"Topics": [
                        {"Text": "Tokio - async runtime", "FirstURL": "https://ddg.example/tokio"}
                    ]}
                ]
            }"#,
            )
            .create_async()
            .await;

        let provider =
            DuckDuckGoProvider::with_base_url(server.url(), Duration::from_secs(5));
        let hits = provider.search("rust", 5).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Rust");
        assert!(hits[1].snippet.contains("Cargo"));
        assert_eq!(hits[2].url, "https://ddg.example/tokio");
    }

    #[tokio::test]
    async fn test_search_bounded_count() {
        let mut server = Server::new_async().await;
        let topics: Vec<String> = (0..10)
            .map(|i| {
                format!(r#"{{"Text": "topic {i}", "FirstURL": "https://ddg.example/{i}"}}"#)
            })
            .collect();
        let body = format!(
            r#"{{"AbstractText": "", "RelatedTopics": [{}]}}"#,
            topics.join(",")
        );
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let provider =
            DuckDuckGoProvider::with_base_url(server.url(), Duration::from_secs(5));
        let hits = provider.search("many", 5).await.unwrap();
        assert_eq!(hits.len(), 5);
    }

    #[tokio::test]
    async fn test_search_no_answers_is_ok_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"AbstractText": "", "RelatedTopics": []}"#)
            .create_async()
            .await;

        let provider =
            DuckDuckGoProvider::with_base_url(server.url(), Duration::from_secs(5));
        let hits = provider.search("nothing", 5).await.unwrap();
        assert!(hits.is_empty());
    }
}
