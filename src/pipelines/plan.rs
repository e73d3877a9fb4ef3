//! Planner mode. One generation call, then the sectioned reply is parsed into
//! ordered steps, information gaps, and suggested next actions.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::ModeResult;
use crate::classifier::Mode;
use crate::gateway::{GenerationRequest, TextGateway};

const PLAN_SYSTEM_PROMPT: &str = "\
You are a planning assistant. When given a complex task or goal:

1. Break it down into clear, actionable steps
2. Identify what information you need but don't have
3. Suggest next actions or questions to gather missing information
4. Be specific and practical

Format your response as:

PLAN:
1. [First step]
2. [Second step]
...

MISSING INFORMATION:
- [What you need to know]
- [Other information needed]

NEXT ACTIONS:
- [Suggested next steps]
";

#[derive(Debug, Default, PartialEq)]
struct ParsedPlan {
    steps: Vec<String>,
    missing_information: Vec<String>,
    next_actions: Vec<String>,
}

pub struct PlanPipeline {
    gateway: Arc<dyn TextGateway>,
}

impl PlanPipeline {
    pub fn new(gateway: Arc<dyn TextGateway>) -> Self {
        Self { gateway }
    }

    pub async fn run(&self, query: &str) -> ModeResult {
        let request = GenerationRequest::new(query)
            .with_system(PLAN_SYSTEM_PROMPT)
            .with_temperature(0.7)
            // Plans run long.
            .with_max_tokens(1500);

        let response = match self.gateway.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "plan generation failed");
                return ModeResult::gateway_degraded(Mode::Plan, &e);
            }
        };

        let parsed = parse_plan(&response);
        let mut result =
            ModeResult::new(Mode::Plan, response).with_meta("tool_used", Value::from("planning"));

        // An unsectioned reply stays a free-text plan; structured fields are
        // only attached when something actually parsed.
        if parsed.steps.is_empty() {
            return result;
        }

        result = result.with_meta("steps", Value::from(parsed.steps));
        if !parsed.missing_information.is_empty() {
            result = result.with_meta("missing_information", Value::from(parsed.missing_information));
        }
        if !parsed.next_actions.is_empty() {
            result = result.with_meta("next_actions", Value::from(parsed.next_actions));
        }
        result
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Plan,
    Missing,
    Actions,
}

fn parse_plan(response: &str) -> ParsedPlan {
    let mut parsed = ParsedPlan::default();
    let mut section = Section::None;

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let upper = line.to_uppercase();
        if upper.starts_with("PLAN") {
            section = Section::Plan;
        } else if upper.contains("MISSING INFORMATION") {
            section = Section::Missing;
        } else if upper.contains("NEXT ACTIONS") || upper.contains("NEXT STEPS") {
            section = Section::Actions;
        } else if section == Section::Plan
            && (line.starts_with(|c: char| c.is_ascii_digit()) || line.starts_with('-'))
        {
            parsed.steps.push(strip_list_marker(line));
        } else if section == Section::Missing && line.starts_with('-') {
            parsed.missing_information.push(strip_list_marker(line));
        } else if section == Section::Actions && line.starts_with('-') {
            parsed.next_actions.push(strip_list_marker(line));
        }
    }

    parsed
}

fn strip_list_marker(line: &str) -> String {
    line.trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | ')' | ' '))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::gateway::GatewayError;

    const SAMPLE_PLAN: &str = "\
PLAN:
1. Learn knife skills and basic techniques
2. Master five foundational recipes
3. Cook one new dish every day

MISSING INFORMATION:
- Your current skill level
- Dietary restrictions

NEXT ACTIONS:
- Pick the first five recipes
";

    struct StaticGateway {
        reply: Option<String>,
    }

    #[async_trait]
    impl TextGateway for StaticGateway {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, GatewayError> {
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(GatewayError::Timeout),
            }
        }
    }

    #[test]
    fn test_parse_plan_sections() {
        let parsed = parse_plan(SAMPLE_PLAN);
        assert_eq!(parsed.steps.len(), 3);
        assert_eq!(parsed.steps[0], "Learn knife skills and basic techniques");
        assert_eq!(parsed.missing_information.len(), 2);
        assert_eq!(parsed.next_actions, vec!["Pick the first five recipes"]);
    }

    #[test]
    fn test_parse_plan_free_text() {
        let parsed = parse_plan("Just start cooking and see how it goes.");
        assert!(parsed.steps.is_empty());
        assert!(parsed.missing_information.is_empty());
    }

    #[tokio::test]
    async fn test_run_attaches_structured_steps() {
        let pipeline = PlanPipeline::new(Arc::new(StaticGateway {
            reply: Some(SAMPLE_PLAN.into()),
        }));
        let result = pipeline.run("How do I learn to cook in 30 days?").await;
        assert_eq!(result.mode, Mode::Plan);
        let steps = result.metadata.get("steps").and_then(|v| v.as_array()).unwrap();
        assert_eq!(steps.len(), 3);
        assert!(result.metadata.contains_key("missing_information"));
    }

    #[tokio::test]
    async fn test_run_unparseable_reply_stays_free_text() {
        let pipeline = PlanPipeline::new(Arc::new(StaticGateway {
            reply: Some("Cooking is mostly practice.".into()),
        }));
        let result = pipeline.run("How do I learn to cook?").await;
        assert_eq!(result.answer, "Cooking is mostly practice.");
        assert!(!result.metadata.contains_key("steps"));
    }

    #[tokio::test]
    async fn test_gateway_failure_degrades() {
        let pipeline = PlanPipeline::new(Arc::new(StaticGateway { reply: None }));
        let result = pipeline.run("Plan a wedding").await;
        assert_eq!(result.metadata.get("degraded"), Some(&Value::Bool(true)));
    }
}
