//! modeswitch: a decision-and-dispatch agent.
//!
//! One text query comes in and is classified into exactly one of four
//! handling strategies: a direct answer, a step-by-step plan, a web-search
//! synthesis, or a sandboxed computation. The [`dispatcher::Dispatcher`] owns
//! the sequence: classify, select the pipeline, run it, and package the
//! result with timing. Generated code runs inside an allow-listed JavaScript
//! sandbox that can degrade its own answer but never escape or crash the
//! dispatch loop.

pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod pipelines;
pub mod sandbox;
pub mod search;

pub use classifier::{Classifier, Mode};
pub use config::AgentConfig;
pub use dispatcher::{AgentResponse, Dispatcher};
pub use error::AgentError;
