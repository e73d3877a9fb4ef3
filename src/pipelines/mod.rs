//! Per-mode execution pipelines.
//!
//! Each pipeline fully handles one mode: it accepts the raw query, talks to
//! its collaborators, and returns a [`ModeResult`]. Pipelines never observe
//! each other's state, and a collaborator failure degrades the answer rather
//! than failing the request.

use serde_json::{Map, Value};

use crate::classifier::Mode;

pub mod act;
pub mod plan;
pub mod respond;
pub mod search;

pub use act::ActPipeline;
pub use plan::PlanPipeline;
pub use respond::RespondPipeline;
pub use search::SearchPipeline;

/// Structured outcome of one pipeline run. Owned by the producing pipeline
/// until the dispatcher packages it with timing for the caller.
#[derive(Debug, Clone)]
pub struct ModeResult {
    pub mode: Mode,
    pub answer: String,
    pub metadata: Map<String, Value>,
}

impl ModeResult {
    pub fn new(mode: Mode, answer: impl Into<String>) -> Self {
        Self {
            mode,
            answer: answer.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Degraded result for an upstream generation failure. The request still
    /// succeeds at the dispatch level; the answer says what went wrong.
    pub fn gateway_degraded(mode: Mode, error: &crate::gateway::GatewayError) -> Self {
        Self::new(
            mode,
            "I was unable to generate an answer right now. Please try again shortly.",
        )
        .with_meta("degraded", Value::Bool(true))
        .with_meta("error", Value::String(error.to_string()))
    }
}
