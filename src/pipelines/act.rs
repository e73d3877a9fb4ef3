//! Computation mode. The model writes a JavaScript fragment; the sandbox runs
//! it; the outcome is folded into the answer.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::ModeResult;
use crate::classifier::Mode;
use crate::gateway::{GenerationRequest, TextGateway};
use crate::sandbox::{ExecutionStatus, SandboxedExecutor};

const ACT_SYSTEM_PROMPT: &str = "\
You are a code generator. When given a calculation or data task:

1. Write clean, simple JavaScript code to solve it
2. Assign the final answer to a variable named 'result'
3. Only use basic language features and the Math object (no imports, no I/O)
4. Include short comments explaining the logic

Format your response as:

```javascript
// Your code here
var result = ...;
```

IMPORTANT: Only output the code block, nothing else.";

pub struct ActPipeline {
    gateway: Arc<dyn TextGateway>,
    executor: Arc<SandboxedExecutor>,
}

impl ActPipeline {
    pub fn new(gateway: Arc<dyn TextGateway>, executor: Arc<SandboxedExecutor>) -> Self {
        Self { gateway, executor }
    }

    pub async fn run(&self, query: &str) -> ModeResult {
        let request = GenerationRequest::new(query)
            .with_system(ACT_SYSTEM_PROMPT)
            // Low temperature keeps generated code dependable.
            .with_temperature(0.3)
            .with_max_tokens(800);

        let response = match self.gateway.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "code generation failed");
                return ModeResult::gateway_degraded(Mode::Act, &e);
            }
        };

        let code = strip_code_fence(&response);
        let outcome = self.executor.execute(&code).await;

        let mut result = match &outcome.status {
            ExecutionStatus::Completed(value) => {
                ModeResult::new(Mode::Act, format!("Result: {}", format_value(value)))
                    .with_meta("execution_success", Value::Bool(true))
                    .with_meta("result", value.clone())
            }
            ExecutionStatus::Rejected(reason) => ModeResult::new(
                Mode::Act,
                format!("The generated code was blocked before execution: {reason}"),
            )
            .with_meta("execution_success", Value::Bool(false))
            .with_meta("failure", Value::from("rejected")),
            ExecutionStatus::RuntimeError(_) => ModeResult::new(
                Mode::Act,
                "The generated code failed while running, so no result is available.",
            )
            .with_meta("execution_success", Value::Bool(false))
            .with_meta("failure", Value::from("runtime_error")),
            ExecutionStatus::Timeout => ModeResult::new(
                Mode::Act,
                "The computation did not finish within the time limit.",
            )
            .with_meta("execution_success", Value::Bool(false))
            .with_meta("failure", Value::from("timeout")),
            ExecutionStatus::NoResult => ModeResult::new(
                Mode::Act,
                "The generated code ran but did not produce a result value.",
            )
            .with_meta("execution_success", Value::Bool(false))
            .with_meta("failure", Value::from("no_result")),
        };

        // The fragment is kept for diagnosis on every path.
        result = result.with_meta("code", Value::from(code));
        if !outcome.stdout.is_empty() {
            result = result.with_meta("stdout", Value::from(outcome.stdout));
        }
        result
    }
}

/// Pull the code out of a markdown fence if the model used one.
fn strip_code_fence(response: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:javascript|js)?\s*\n(.*?)```")
            .expect("code fence pattern must compile")
    });

    match fence.captures(response) {
        Some(caps) => caps[1].trim().to_string(),
        None => response.trim().to_string(),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
