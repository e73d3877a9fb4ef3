//! Web-search capability: an ordered list of result hits for a query.
//!
//! Two backends share the [`SearchProvider`] contract: Serper (primary) and
//! the DuckDuckGo Instant Answer API (fallback). The search pipeline decides
//! when to fall back; providers just report their hits or their failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod duckduckgo;
pub mod serper;

pub use duckduckgo::DuckDuckGoProvider;
pub use serper::{SerperConfig, SerperProvider};

/// A single retrieved search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Errors raised by a search backend.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend has no credentials configured")]
    MissingCredentials,

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Query in, ordered hits out. An `Ok` with an empty vector means the backend
/// responded but found nothing; callers treat that the same as a failure.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short backend identifier, recorded in result metadata.
    fn id(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, SearchError>;
}
