use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use mercabot_core::{ContextMessage, Entities, Intent};

use crate::llm::LlmClient;
use crate::prompt::render_reasoner_prompt;

/// First `{...}` block in free text, greedy so nested entity objects stay
/// inside the match.
static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid json block pattern"));

/// Confidence assumed when the model emits an intent without a number.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// What the deep tier concluded. Structurally mirrors the guardrail result so
/// the router can adopt it wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct BrainVerdict {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: Entities,
    pub reasoning: String,
}

impl BrainVerdict {
    fn unclear(reasoning: &str) -> Self {
        Self {
            intent: Intent::Unclear,
            confidence: 0.0,
            entities: Entities::default(),
            reasoning: reasoning.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawVerdict {
    intent: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    entities: Option<Entities>,
    reasoning: Option<String>,
}

/// The deep tier seam the router dispatches through. Infallible by contract;
/// every failure mode is folded into the verdict shape.
#[async_trait::async_trait]
pub trait Reasoner: Send + Sync {
    async fn reason(&self, utterance: &str, history: &[ContextMessage]) -> BrainVerdict;
}

/// The slow tier. The LLM is an optional capability: a brain built without a
/// client, or one whose call times out or fails, degrades to the same
/// `UNCLEAR` shape a parse failure produces. `reason` never returns an error.
pub struct Brain {
    llm: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
}

impl Brain {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// A brain with no model behind it; every call degrades gracefully.
    pub fn disabled() -> Self {
        Self { llm: None, timeout: Duration::from_secs(30) }
    }
}

#[async_trait::async_trait]
impl Reasoner for Brain {
    async fn reason(&self, utterance: &str, history: &[ContextMessage]) -> BrainVerdict {
        let Some(llm) = &self.llm else {
            return BrainVerdict::unclear("reasoner unavailable");
        };

        let prompt = render_reasoner_prompt(utterance, history);
        let completion = match tokio::time::timeout(self.timeout, llm.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => {
                tracing::warn!(
                    event_name = "brain.request_failed",
                    error = %error,
                    "deep reasoner call failed"
                );
                return BrainVerdict::unclear("reasoner call failed");
            }
            Err(_) => {
                tracing::warn!(
                    event_name = "brain.timeout",
                    timeout_secs = self.timeout.as_secs(),
                    "deep reasoner timed out"
                );
                return BrainVerdict::unclear("reasoner timed out");
            }
        };

        let verdict = parse_verdict(&completion);
        tracing::debug!(
            event_name = "brain.verdict",
            intent = %verdict.intent,
            confidence = verdict.confidence,
            "deep reasoner verdict"
        );
        verdict
    }
}

/// Parsing policy, in order: whole response as JSON, then the first `{...}`
/// block scraped out of free text, then `UNCLEAR`.
fn parse_verdict(completion: &str) -> BrainVerdict {
    if let Ok(raw) = serde_json::from_str::<RawVerdict>(completion.trim()) {
        return coerce(raw);
    }

    if let Some(block) = JSON_BLOCK.find(completion) {
        if let Ok(raw) = serde_json::from_str::<RawVerdict>(block.as_str()) {
            return coerce(raw);
        }
    }

    BrainVerdict::unclear("parse failed")
}

/// An intent string outside the closed vocabulary is coerced to `UNCLEAR`.
fn coerce(raw: RawVerdict) -> BrainVerdict {
    let intent = raw
        .intent
        .as_deref()
        .map(Intent::from_wire)
        .unwrap_or(Intent::Unclear);

    let confidence = if intent == Intent::Unclear {
        0.0
    } else {
        raw.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0)
    };

    BrainVerdict {
        intent,
        confidence,
        entities: raw.entities.unwrap_or_default(),
        reasoning: raw.reasoning.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use mercabot_core::Intent;

    use super::{parse_verdict, Brain, Reasoner};
    use crate::llm::LlmClient;

    struct CannedClient(String);

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn structured_json_parses_directly() {
        let verdict = parse_verdict(
            r#"{"intent": "PRODUCT_SEARCH", "confidence": 0.81, "entities": {"search_term": "mochila"}, "reasoning": "wants a backpack"}"#,
        );
        assert_eq!(verdict.intent, Intent::ProductSearch);
        assert_eq!(verdict.confidence, 0.81);
        assert_eq!(verdict.entities.search_term.as_deref(), Some("mochila"));
    }

    #[test]
    fn json_is_scraped_out_of_chatty_text() {
        let verdict = parse_verdict(
            "Sure! After thinking about it, here is my answer:\n\
             {\"intent\": \"GREETING\", \"confidence\": 0.9, \"reasoning\": \"says hola\"}\n\
             Let me know if you need anything else.",
        );
        assert_eq!(verdict.intent, Intent::Greeting);
        assert_eq!(verdict.confidence, 0.9);
    }

    #[test]
    fn garbage_output_degrades_to_unclear() {
        let verdict = parse_verdict("I cannot classify this message, sorry!");
        assert_eq!(verdict.intent, Intent::Unclear);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reasoning, "parse failed");
    }

    #[test]
    fn out_of_vocabulary_intent_is_coerced_to_unclear() {
        let verdict =
            parse_verdict(r#"{"intent": "BUY_EVERYTHING", "confidence": 0.99, "reasoning": "?"}"#);
        assert_eq!(verdict.intent, Intent::Unclear);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn missing_confidence_gets_the_default() {
        let verdict = parse_verdict(r#"{"intent": "GRATITUDE"}"#);
        assert_eq!(verdict.intent, Intent::Gratitude);
        assert_eq!(verdict.confidence, 0.5);
    }

    #[tokio::test]
    async fn disabled_brain_degrades_to_unclear() {
        let verdict = Brain::disabled().reason("hola", &[]).await;
        assert_eq!(verdict.intent, Intent::Unclear);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_unclear() {
        let brain = Brain::new(Some(Arc::new(FailingClient)), Duration::from_secs(5));
        let verdict = brain.reason("hola", &[]).await;
        assert_eq!(verdict.intent, Intent::Unclear);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reasoning, "reasoner call failed");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_degrades_like_a_parse_failure() {
        let brain = Brain::new(Some(Arc::new(SlowClient)), Duration::from_secs(30));
        let verdict = brain.reason("hola", &[]).await;
        assert_eq!(verdict.intent, Intent::Unclear);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reasoning, "reasoner timed out");
    }

    #[tokio::test]
    async fn canned_client_verdict_is_adopted() {
        let brain = Brain::new(
            Some(Arc::new(CannedClient(
                r#"{"intent": "RETURNS", "confidence": 0.72, "reasoning": "wants to return"}"#
                    .to_string(),
            ))),
            Duration::from_secs(5),
        );
        let verdict = brain.reason("me llegó roto", &[]).await;
        assert_eq!(verdict.intent, Intent::Returns);
        assert_eq!(verdict.confidence, 0.72);
    }
}
