use thiserror::Error;

/// Errors the dispatcher can return to its caller. Pipeline-internal failures
/// never appear here; they are folded into the answer instead.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Query must not be empty")]
    EmptyQuery,
}
