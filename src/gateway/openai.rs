//! OpenAI chat-completions gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use super::error::GatewayError;
use super::{GenerationRequest, TextGateway};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Per-call timeout applied to the HTTP client.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn build_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| GatewayError::InvalidRequest(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn build_payload(&self, request: &GenerationRequest) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": request.prompt,
        }));

        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    fn parse_content(body: &Value) -> String {
        body.get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string()
    }

    fn map_error(status: u16, body: &str) -> GatewayError {
        if status == 401 || status == 403 {
            return GatewayError::AuthenticationError(body.to_string());
        }
        if status == 429 {
            return GatewayError::RateLimitExceeded { retry_after: None };
        }
        GatewayError::ApiError {
            status,
            message: body.to_string(),
        }
    }
}

#[async_trait]
impl TextGateway for OpenAiGateway {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        let headers = self.build_headers()?;
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = self.build_payload(&request);

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::map_error(status.as_u16(), &text));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| GatewayError::SerializationError(e.to_string()))?;
        Ok(Self::parse_content(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn base_config(base_url: String) -> OpenAiConfig {
        OpenAiConfig {
            api_key: "test-key".into(),
            base_url,
            model: "gpt-4o-mini".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_generate_returns_completion() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "model": "gpt-4o-mini",
                "choices": [{"message": {"content": "  hello  "}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
            }"#,
            )
            .create_async()
            .await;

        let gateway = OpenAiGateway::new(base_config(server.url()));
        let content = gateway
            .generate(GenerationRequest::new("hi").with_system("be brief"))
            .await
            .unwrap();
        assert_eq!(content, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_auth_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("invalid key")
            .create_async()
            .await;

        let gateway = OpenAiGateway::new(base_config(server.url()));
        let err = gateway
            .generate(GenerationRequest::new("hi"))
            .await
            .unwrap_err();
        match err {
            GatewayError::AuthenticationError(msg) => assert!(msg.contains("invalid key")),
            other => panic!("Expected AuthenticationError, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let gateway = OpenAiGateway::new(base_config(server.url()));
        let err = gateway
            .generate(GenerationRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_generate_sends_temperature_and_model() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "max_tokens": 8,
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "ACT"}}]}"#)
            .create_async()
            .await;

        let gateway = OpenAiGateway::new(base_config(server.url()));
        let content = gateway
            .generate(
                GenerationRequest::new("What is 2+2?")
                    .with_temperature(0.0)
                    .with_max_tokens(8),
            )
            .await
            .unwrap();
        assert_eq!(content, "ACT");
        mock.assert_async().await;
    }
}
