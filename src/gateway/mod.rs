//! Uniform call contract to a text-generation capability.
//!
//! Every other component talks to the model through [`TextGateway`], so the
//! whole core can be exercised with a fake gateway in tests. The one
//! production implementation is [`OpenAiGateway`].

use async_trait::async_trait;

pub mod error;
pub mod openai;

pub use error::GatewayError;
pub use openai::{OpenAiConfig, OpenAiGateway};

/// A single generation request: optional system prompt, user prompt, and
/// sampling controls.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Prompt in, completion out.
#[async_trait]
pub trait TextGateway: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError>;
}
