//! Search-synthesis mode. Retrieve from the web, then synthesize an answer
//! grounded only in the retrieved snippets.

use std::sync::{Arc, OnceLock};

use chrono::{Datelike, Utc};
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::ModeResult;
use crate::classifier::Mode;
use crate::gateway::{GenerationRequest, TextGateway};
use crate::search::{SearchHit, SearchProvider};

const SYNTHESIS_SYSTEM_PROMPT: &str = "\
You are a research assistant. You will be given search results from the web.
Your job is to synthesize the information and provide a clear, accurate answer to the user's question.

Guidelines:
- Use only information from the provided search results
- Be precise about context and scope; do not generalize beyond what the results state
- If the results don't fully answer the question, explicitly say so
- Be concise but comprehensive
- Cite sources by their result number when relevant
";

const RECENCY_KEYWORDS: &[&str] = &["latest", "recent", "current", "today", "now", "news"];

pub struct SearchPipeline {
    gateway: Arc<dyn TextGateway>,
    providers: Vec<Arc<dyn SearchProvider>>,
    max_results: usize,
}

impl SearchPipeline {
    /// Providers are tried in order; each one after the first is a fallback.
    pub fn new(
        gateway: Arc<dyn TextGateway>,
        providers: Vec<Arc<dyn SearchProvider>>,
        max_results: usize,
    ) -> Self {
        Self {
            gateway,
            providers,
            max_results,
        }
    }

    pub async fn run(&self, query: &str) -> ModeResult {
        let effective_query = rewrite_for_freshness(query);

        let (hits, backend) = match self.retrieve(&effective_query).await {
            Some(found) => found,
            None => {
                return ModeResult::new(
                    Mode::Search,
                    "No current information could be retrieved: all search backends \
                     failed or returned nothing. Please check an official source directly.",
                )
                .with_meta("search_unavailable", Value::Bool(true))
                .with_meta("sources", Value::Array(vec![]));
            }
        };

        let request = GenerationRequest::new(build_synthesis_prompt(query, &hits))
            .with_system(SYNTHESIS_SYSTEM_PROMPT)
            .with_temperature(0.5)
            .with_max_tokens(1000);

        let sources: Vec<Value> = hits
            .iter()
            .map(|hit| json!({ "title": hit.title, "url": hit.url }))
            .collect();

        let result = match self.gateway.generate(request).await {
            Ok(answer) => ModeResult::new(Mode::Search, answer),
            Err(e) => {
                warn!(error = %e, "search synthesis failed");
                ModeResult::gateway_degraded(Mode::Search, &e)
            }
        };

        result
            .with_meta("sources", Value::Array(sources))
            .with_meta("backend", Value::from(backend))
            .with_meta("num_results", Value::from(hits.len()))
    }

    /// First provider that yields a non-empty hit list wins. An error and an
    /// empty result set both trigger the next fallback.
    async fn retrieve(&self, query: &str) -> Option<(Vec<SearchHit>, String)> {
        for provider in &self.providers {
            match provider.search(query, self.max_results).await {
                Ok(hits) if !hits.is_empty() => {
                    info!(backend = provider.id(), count = hits.len(), "search succeeded");
                    return Some((hits, provider.id().to_string()));
                }
                Ok(_) => {
                    warn!(backend = provider.id(), "search returned no results, falling back");
                }
                Err(e) => {
                    warn!(backend = provider.id(), error = %e, "search failed, falling back");
                }
            }
        }
        None
    }
}

/// Append the current year to time-sensitive queries that don't already name
/// a year, to bias retrieval toward fresh results.
fn rewrite_for_freshness(query: &str) -> String {
    let lowered = query.to_lowercase();
    let time_sensitive = RECENCY_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    if !time_sensitive {
        return query.to_string();
    }

    static YEAR: OnceLock<Regex> = OnceLock::new();
    let year = YEAR
        .get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year pattern must compile"));
    if year.is_match(query) {
        return query.to_string();
    }

    format!("{} {}", query, Utc::now().year())
}

fn build_synthesis_prompt(query: &str, hits: &[SearchHit]) -> String {
    let mut text = String::from("Search Results:\n\n");
    for (i, hit) in hits.iter().enumerate() {
        text.push_str(&format!(
            "Result {}:\nTitle: {}\nContent: {}\nURL: {}\n\n",
            i + 1,
            hit.title,
            hit.snippet,
            hit.url
        ));
    }
    text.push_str(&format!(
        "User Question: {}\n\nProvide a clear answer based on the search results above.",
        query
    ));
    text
}
