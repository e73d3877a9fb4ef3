//! The dispatch loop: classify, select a pipeline, run it, package the result
//! with timing.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::classifier::{Classifier, Mode};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::gateway::openai::OpenAiGateway;
use crate::gateway::TextGateway;
use crate::pipelines::{ActPipeline, ModeResult, PlanPipeline, RespondPipeline, SearchPipeline};
use crate::sandbox::SandboxedExecutor;
use crate::search::duckduckgo::DuckDuckGoProvider;
use crate::search::serper::{SerperConfig, SerperProvider};
use crate::search::SearchProvider;

/// What the caller gets back for one query.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub mode: Mode,
    pub answer: String,
    pub latency_ms: u64,
    pub metadata: Map<String, Value>,
}

pub struct Dispatcher {
    classifier: Classifier,
    respond: RespondPipeline,
    plan: PlanPipeline,
    search: SearchPipeline,
    act: ActPipeline,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn TextGateway>,
        search_providers: Vec<Arc<dyn SearchProvider>>,
        executor: Arc<SandboxedExecutor>,
        max_search_results: usize,
    ) -> Self {
        Self {
            classifier: Classifier::new(gateway.clone()),
            respond: RespondPipeline::new(gateway.clone()),
            plan: PlanPipeline::new(gateway.clone()),
            search: SearchPipeline::new(gateway.clone(), search_providers, max_search_results),
            act: ActPipeline::new(gateway, executor),
        }
    }

    /// Wire up the production collaborators from configuration.
    pub fn from_config(config: &AgentConfig) -> Self {
        let gateway: Arc<dyn TextGateway> = Arc::new(OpenAiGateway::new(config.openai.clone()));

        let serper = SerperProvider::new(SerperConfig {
            api_key: config.serper_api_key.clone(),
            timeout: config.search_timeout,
            ..SerperConfig::default()
        });
        let duckduckgo = DuckDuckGoProvider::new(config.search_timeout);
        let providers: Vec<Arc<dyn SearchProvider>> =
            vec![Arc::new(serper), Arc::new(duckduckgo)];

        let executor = Arc::new(SandboxedExecutor::new(config.sandbox.clone()));

        Self::new(gateway, providers, executor, config.max_search_results)
    }

    /// Handle one query end to end.
    ///
    /// Only malformed top-level input is rejected here; every pipeline-level
    /// failure still produces a well-formed response.
    pub async fn handle(&self, query: &str) -> Result<AgentResponse, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        let start = Instant::now();
        let mode = self.classifier.classify(query).await;
        info!(%mode, "query classified");

        let result: ModeResult = match mode {
            Mode::Respond => self.respond.run(query).await,
            Mode::Plan => self.plan.run(query).await,
            Mode::Search => self.search.run(query).await,
            Mode::Act => self.act.run(query).await,
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        info!(mode = %result.mode, latency_ms, "query handled");

        Ok(AgentResponse {
            mode: result.mode,
            answer: result.answer,
            latency_ms,
            metadata: result.metadata,
        })
    }
}
