//! Sandboxed execution of model-generated code fragments.
//!
//! The security-critical boundary of the crate. Fragments run in a fresh,
//! allow-listed JavaScript namespace with no import mechanism, no filesystem,
//! no network, and no host reflection; execution is wall-clock bounded and the
//! namespace is discarded after every invocation. See [`SandboxedExecutor`].

use std::time::Duration;

use serde_json::Value;

pub mod error;
pub mod executor;

pub use error::SandboxError;
pub use executor::{SandboxedExecutor, RESULT_VARIABLE};

/// Sandbox resource limits and the global allow-list.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    /// Max fragment length (bytes).
    pub max_code_length: usize,

    /// Wall-clock execution bound. Enforced independently of any network
    /// timeout: fragment execution is local.
    pub timeout: Duration,

    /// Engine-level loop iteration cap so unbounded loops terminate on the
    /// blocking thread even after the caller has already received a timeout.
    pub loop_iteration_limit: u64,

    /// Globals that survive the namespace scrub. Everything else is removed
    /// before the fragment runs.
    pub allowed_globals: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_code_length: 64 * 1024,
            timeout: Duration::from_secs(5),
            loop_iteration_limit: 5_000_000,
            allowed_globals: vec![
                "JSON".into(),
                "Math".into(),
                "Number".into(),
                "String".into(),
                "Boolean".into(),
                "Array".into(),
                "Object".into(),
                "parseInt".into(),
                "parseFloat".into(),
                "isNaN".into(),
                "isFinite".into(),
                "NaN".into(),
                "Infinity".into(),
                "undefined".into(),
                "Error".into(),
                "RangeError".into(),
                "TypeError".into(),
                "RegExp".into(),
            ],
        }
    }
}

/// What happened when a fragment ran.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStatus {
    /// The fragment ran and assigned the designated result variable.
    Completed(Value),
    /// The fragment was refused before execution by the dangerous-code screen.
    Rejected(String),
    /// The fragment ran and raised.
    RuntimeError(String),
    /// The fragment exceeded the wall-clock bound.
    Timeout,
    /// The fragment ran to completion without assigning the result variable.
    NoResult,
}

/// Outcome of one sandbox invocation. Produced once per computation request
/// and never reused.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    /// Text the fragment printed, captured separately from the result value.
    pub stdout: String,
    pub duration: Duration,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed(_))
    }
}
