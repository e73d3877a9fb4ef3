//! Direct-answer mode. No tools, just one generation call.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::ModeResult;
use crate::classifier::Mode;
use crate::gateway::{GenerationRequest, TextGateway};

const RESPOND_SYSTEM_PROMPT: &str = "\
You are a helpful assistant. Answer the user's question clearly and concisely.
Provide accurate information based on your knowledge. If you're not sure about something, say so.";

pub struct RespondPipeline {
    gateway: Arc<dyn TextGateway>,
}

impl RespondPipeline {
    pub fn new(gateway: Arc<dyn TextGateway>) -> Self {
        Self { gateway }
    }

    pub async fn run(&self, query: &str) -> ModeResult {
        let request = GenerationRequest::new(query)
            .with_system(RESPOND_SYSTEM_PROMPT)
            .with_temperature(0.7)
            .with_max_tokens(1000);

        match self.gateway.generate(request).await {
            Ok(answer) => {
                ModeResult::new(Mode::Respond, answer).with_meta("tool_used", Value::Null)
            }
            Err(e) => {
                warn!(error = %e, "direct answer generation failed");
                ModeResult::gateway_degraded(Mode::Respond, &e)
            }
        }
    }
}
