//! Allow-list JavaScript executor built on boa_engine.
//!
//! Each invocation gets a fresh engine context. A prelude removes every global
//! that is not on the allow-list, neutralizes the string-evaluating function
//! constructors (plain, generator, async, and async-generator), and freezes
//! the core prototypes, so the namespace the fragment sees simply does
//! not contain import, filesystem, network, process, or reflection symbols —
//! a fresh minimal namespace rather than a patched general-purpose one. The
//! fragment's outputs come back over a `JSON.stringify` bridge: the designated
//! `result` variable plus anything it printed.

use std::sync::OnceLock;
use std::time::Instant;

use boa_engine::{Context, Source};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::SandboxError;
use super::{ExecutionOutcome, ExecutionStatus, SandboxConfig};

/// The variable a fragment must assign its final value to.
pub const RESULT_VARIABLE: &str = "result";

/// Patterns refused before execution. The scrubbed namespace would stop these
/// anyway; screening first gives a clear rejection instead of a reference
/// error deep in the fragment.
const DANGEROUS_PATTERNS: &[(&str, &str)] = &[
    (r"\beval\s*\(", "dynamic evaluation (eval)"),
    (r"\bFunction\s*\(", "Function constructor"),
    (r"\bnew\s+Function\b", "Function constructor"),
    (r"\.constructor\s*\(", "constructor invocation"),
    (r"\brequire\s*\(", "module import (require)"),
    (r"\bimport\b", "module import"),
    (r"\bfetch\s*\(", "network access (fetch)"),
    (r"\bXMLHttpRequest\b", "network access (XMLHttpRequest)"),
    (r"__proto__", "prototype access"),
    (r"\bglobalThis\b", "host global access"),
];

fn dangerous_patterns() -> &'static Vec<(Regex, &'static str)> {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DANGEROUS_PATTERNS
            .iter()
            .map(|(pattern, label)| {
                (
                    Regex::new(pattern).expect("dangerous-code pattern must compile"),
                    *label,
                )
            })
            .collect()
    })
}

/// Runs untrusted fragments inside the restricted namespace.
///
/// `execute` never returns an error: every failure is folded into the
/// [`ExecutionOutcome`], so a misbehaving fragment can degrade its own answer
/// but cannot take the dispatch loop down.
pub struct SandboxedExecutor {
    config: SandboxConfig,
}

impl SandboxedExecutor {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Execute one fragment and report what happened.
    pub async fn execute(&self, code: &str) -> ExecutionOutcome {
        let start = Instant::now();

        if let Err(e) = self.screen(code) {
            warn!(error = %e, "fragment rejected before execution");
            return ExecutionOutcome {
                status: ExecutionStatus::Rejected(e.to_string()),
                stdout: String::new(),
                duration: start.elapsed(),
            };
        }

        // boa is synchronous; run it on the blocking pool and bound our wait
        // independently of the engine's own loop limit.
        let config = self.config.clone();
        let fragment = code.to_string();
        let handle = tokio::task::spawn_blocking(move || run_fragment(&fragment, &config));

        let (status, stdout) = match tokio::time::timeout(self.config.timeout, handle).await {
            Err(_) => (ExecutionStatus::Timeout, String::new()),
            Ok(Err(join_err)) => (
                ExecutionStatus::RuntimeError(format!("sandbox task failed: {join_err}")),
                String::new(),
            ),
            Ok(Ok(Err(SandboxError::ExecutionTimeout))) => {
                (ExecutionStatus::Timeout, String::new())
            }
            Ok(Ok(Err(e))) => (ExecutionStatus::RuntimeError(e.to_string()), String::new()),
            Ok(Ok(Ok((Some(value), prints)))) => {
                (ExecutionStatus::Completed(value), prints.join("\n"))
            }
            Ok(Ok(Ok((None, prints)))) => (ExecutionStatus::NoResult, prints.join("\n")),
        };

        let duration = start.elapsed();
        debug!(?status, ?duration, "fragment executed");
        ExecutionOutcome {
            status,
            stdout,
            duration,
        }
    }

    fn screen(&self, code: &str) -> Result<(), SandboxError> {
        if code.len() > self.config.max_code_length {
            return Err(SandboxError::CodeTooLarge {
                max: self.config.max_code_length,
                actual: code.len(),
            });
        }

        for (pattern, label) in dangerous_patterns() {
            if pattern.is_match(code) {
                return Err(SandboxError::DangerousCode(label.to_string()));
            }
        }

        Ok(())
    }
}

impl Default for SandboxedExecutor {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

type FragmentOutput = (Option<Value>, Vec<String>);

/// Run a fragment inside a fresh boa context. Blocking.
fn run_fragment(code: &str, config: &SandboxConfig) -> Result<FragmentOutput, SandboxError> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(config.loop_iteration_limit);

    let full_code = build_wrapper(code, &config.allowed_globals);

    let start = Instant::now();
    let evaluated = context.eval(Source::from_bytes(&full_code));
    let elapsed = start.elapsed();

    let value = match evaluated {
        Ok(v) => v,
        Err(e) => {
            let msg = e.to_string();
            if elapsed >= config.timeout || msg.to_lowercase().contains("iteration limit") {
                return Err(SandboxError::ExecutionTimeout);
            }
            return Err(SandboxError::ExecutionError(msg));
        }
    };

    if elapsed >= config.timeout {
        return Err(SandboxError::ExecutionTimeout);
    }

    let bridge = value
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .ok_or_else(|| {
            SandboxError::InternalError("wrapper did not return a JSON string".to_string())
        })?;

    let wrapper: Value = serde_json::from_str(&bridge)
        .map_err(|e| SandboxError::SerializationError(format!("Failed to parse output: {e}")))?;

    let prints = wrapper
        .get("prints")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let has_result = wrapper
        .get("has_result")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let result = if has_result {
        Some(wrapper.get("result").cloned().unwrap_or(Value::Null))
    } else {
        None
    };

    Ok((result, prints))
}

/// Wrap a fragment with the print capture, the namespace scrub, and the
/// result-extraction bridge.
///
/// `var`/function declarations in the fragment are hoisted before the scrub
/// runs and the global stays extensible, so the fragment can still create its
/// own bindings — it just has nothing dangerous left to reach.
fn build_wrapper(code: &str, allowed_globals: &[String]) -> String {
    let mut allowed: Vec<String> = allowed_globals.to_vec();
    // Internals of the wrapper itself.
    for name in ["print", "__prints", "__allowed", "__global", "__fn_protos"] {
        allowed.push(name.to_string());
    }
    allowed.sort();
    allowed.dedup();
    let allowed_list = allowed
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"
var __prints = [];
function print() {{
    var parts = [];
    for (var i = 0; i < arguments.length; i++) {{
        var arg = arguments[i];
        if (typeof arg === 'object' && arg !== null) {{
            parts.push(JSON.stringify(arg));
        }} else {{
            parts.push(String(arg));
        }}
    }}
    __prints.push(parts.join(' '));
}}

var __allowed = new Set([{allowed_list}]);
var __global = (typeof globalThis !== 'undefined') ? globalThis : this;
Object.getOwnPropertyNames(__global).forEach(function (key) {{
    if (!__allowed.has(key)) {{
        try {{ delete __global[key]; }} catch (e) {{ __global[key] = undefined; }}
    }}
}});
var __fn_protos = [
    Object.getPrototypeOf(function () {{}}),
    Object.getPrototypeOf(function* () {{}}),
    Object.getPrototypeOf(async function () {{}}),
    Object.getPrototypeOf(async function* () {{}})
];
__fn_protos.forEach(function (proto) {{
    Object.defineProperty(proto, 'constructor', {{ value: undefined }});
    Object.freeze(proto);
}});
Object.freeze(Object.prototype);
Object.freeze(Array.prototype);

// Fragment
{code}

(function () {{
    var __has = (typeof {result_var} !== 'undefined');
    return JSON.stringify({{
        has_result: __has,
        result: __has ? {result_var} : null,
        prints: __prints
    }});
}})();
"#,
        allowed_list = allowed_list,
        code = code,
        result_var = RESULT_VARIABLE,
    )
}
