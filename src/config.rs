//! Configuration, assembled once at startup and passed to constructors.
//! Nothing reads the environment after this point.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::openai::OpenAiConfig;
use crate::sandbox::SandboxConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub openai: OpenAiConfig,
    /// Primary search backend credential. Without it the primary backend
    /// reports missing credentials and the fallback takes over.
    pub serper_api_key: Option<String>,
    pub search_timeout: Duration,
    pub max_search_results: usize,
    pub sandbox: SandboxConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            serper_api_key: None,
            search_timeout: Duration::from_secs(10),
            max_search_results: 5,
            sandbox: SandboxConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Read configuration from the environment. `OPENAI_API_KEY` is required;
    /// everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY"))?;

        let mut openai = OpenAiConfig {
            api_key,
            ..OpenAiConfig::default()
        };
        if let Ok(model) = env::var("OPENAI_MODEL") {
            openai.model = model;
        }
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            openai.base_url = base_url;
        }

        Ok(Self {
            openai,
            serper_api_key: env::var("SERPER_API_KEY").ok(),
            ..Self::default()
        })
    }
}
