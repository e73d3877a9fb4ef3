//! Query classification: map a raw query to exactly one handling mode.
//!
//! The model itself is used as the classifier, with a fixed routing prompt and
//! temperature pinned to 0 so identical queries classify identically. Parsing
//! is deliberately loose: any completion that does not resolve to a known tag
//! falls back to [`Mode::Respond`]. Availability of some answer is prioritized
//! over routing precision, so the fallback is immediate and local — no retries.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gateway::{GenerationRequest, TextGateway};

/// The four handling strategies a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Knowledge-only question, answered directly.
    Respond,
    /// Complex goal that needs a step breakdown.
    Plan,
    /// Needs current or external facts.
    Search,
    /// Needs arithmetic or code execution.
    Act,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Respond, Mode::Plan, Mode::Search, Mode::Act];

    pub fn as_tag(&self) -> &'static str {
        match self {
            Mode::Respond => "RESPOND",
            Mode::Plan => "PLAN",
            Mode::Search => "SEARCH",
            Mode::Act => "ACT",
        }
    }

    pub fn from_tag(s: &str) -> Option<Mode> {
        match s.trim().to_uppercase().as_str() {
            "RESPOND" => Some(Mode::Respond),
            "PLAN" => Some(Mode::Plan),
            "SEARCH" => Some(Mode::Search),
            "ACT" => Some(Mode::Act),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

const ROUTER_SYSTEM_PROMPT: &str = "\
You are a routing agent. Your ONLY job is to classify the user's query into exactly ONE of these four categories:

RESPOND - Simple questions that can be answered directly with existing knowledge. No tools needed.
Examples: \"What is the capital of France?\", \"Explain photosynthesis\", \"Tell me about Rust\"

PLAN - Complex tasks requiring multiple steps or where information is missing.
Examples: \"Help me plan a wedding\", \"I want to start a business\", \"How do I learn machine learning?\"

SEARCH - Questions requiring current, real-time, or recent information not in training data.
Examples: \"What's the weather today?\", \"Latest news on AI\", \"Current stock price of Tesla\"

ACT - Questions requiring calculations, data processing, or code execution.
Examples: \"Calculate 234 * 567\", \"Generate fibonacci numbers\", \"What's the square root of 12345?\"

You must respond with ONLY ONE WORD: RESPOND, PLAN, SEARCH, or ACT.
No explanation. No punctuation. Just the mode name.";

/// LLM-backed query classifier with a safe default.
pub struct Classifier {
    gateway: Arc<dyn TextGateway>,
}

impl Classifier {
    pub fn new(gateway: Arc<dyn TextGateway>) -> Self {
        Self { gateway }
    }

    /// Classify a query into exactly one [`Mode`].
    ///
    /// Never fails: unparseable completions and gateway errors both fall back
    /// to [`Mode::Respond`].
    pub async fn classify(&self, query: &str) -> Mode {
        let request = GenerationRequest::new(query)
            .with_system(ROUTER_SYSTEM_PROMPT)
            .with_temperature(0.0)
            .with_max_tokens(8);

        let completion = match self.gateway.generate(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, "classifier gateway call failed, defaulting to RESPOND");
                return Mode::Respond;
            }
        };

        let mode = parse_mode(&completion);
        debug!(%mode, completion = %completion.trim(), "classified query");
        mode
    }
}

/// Parse a classifier completion into a mode.
///
/// Exact tag match first (case-insensitive), then a substring scan for models
/// that wrap the tag in extra text, then the RESPOND fallback.
fn parse_mode(completion: &str) -> Mode {
    if let Some(mode) = Mode::from_tag(completion) {
        return mode;
    }

    let upper = completion.to_uppercase();
    for mode in Mode::ALL {
        if upper.contains(mode.as_tag()) {
            return mode;
        }
    }

    Mode::Respond
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::gateway::GatewayError;

    struct CannedGateway {
        reply: Option<String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl CannedGateway {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGateway for CannedGateway {
        async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Some(s) => Ok(s.clone()),
                None => Err(GatewayError::NetworkError("connection refused".into())),
            }
        }
    }

    #[test]
    fn test_parse_exact_tags() {
        assert_eq!(parse_mode("RESPOND"), Mode::Respond);
        assert_eq!(parse_mode("plan"), Mode::Plan);
        assert_eq!(parse_mode("  Search  "), Mode::Search);
        assert_eq!(parse_mode("act\n"), Mode::Act);
    }

    #[test]
    fn test_parse_tag_embedded_in_prose() {
        assert_eq!(parse_mode("The mode is PLAN."), Mode::Plan);
        assert_eq!(parse_mode("I would choose ACT for this one"), Mode::Act);
    }

    #[test]
    fn test_parse_fallback_on_garbage() {
        assert_eq!(parse_mode(""), Mode::Respond);
        assert_eq!(parse_mode("I cannot classify this"), Mode::Respond);
        assert_eq!(parse_mode("MODE_UNKNOWN"), Mode::Respond);
    }

    #[test]
    fn test_mode_serializes_as_upper_tag() {
        assert_eq!(serde_json::to_string(&Mode::Search).unwrap(), "\"SEARCH\"");
        let mode: Mode = serde_json::from_str("\"ACT\"").unwrap();
        assert_eq!(mode, Mode::Act);
    }

    #[tokio::test]
    async fn test_classify_uses_zero_temperature() {
        let gateway = Arc::new(CannedGateway::ok("ACT"));
        let classifier = Classifier::new(gateway.clone());
        let mode = classifier.classify("Calculate 2+2").await;
        assert_eq!(mode, Mode::Act);

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert!(requests[0]
            .system
            .as_deref()
            .unwrap()
            .contains("routing agent"));
    }

    #[tokio::test]
    async fn test_classify_falls_back_on_gateway_error() {
        let classifier = Classifier::new(Arc::new(CannedGateway::failing()));
        let mode = classifier.classify("anything").await;
        assert_eq!(mode, Mode::Respond);
    }
}
