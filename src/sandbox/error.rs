use thiserror::Error;

/// Internal sandbox failures. These never leave the sandbox module as errors;
/// the executor converts every one of them into an [`super::ExecutionOutcome`].
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Code too large (max {max} bytes, got {actual} bytes)")]
    CodeTooLarge { max: usize, actual: usize },

    #[error("Dangerous code detected: {0}")]
    DangerousCode(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Execution timeout")]
    ExecutionTimeout,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
