use std::sync::Arc;

use anyhow::Result;
use regex::Regex;

use mercabot_core::config::RoutingConfig;
use mercabot_core::text::normalize;
use mercabot_core::{ClassificationResult, ContextMessage, Intent};
use mercabot_session::{SessionStore, StatePatch};

use crate::brain::Reasoner;
use crate::guardrail::match_destination;

/// Intents safe to resolve on the fast path above the lower confidence bar.
pub const TRIVIAL_INTENTS: &[Intent] = &[
    Intent::Greeting,
    Intent::Gratitude,
    Intent::GeneralHelp,
    Intent::OutOfScope,
    Intent::PricingInfo,
    Intent::NavigationHelp,
    Intent::HumanEscalation,
    Intent::OrderTracking,
    Intent::OrderProcess,
    Intent::OrderStatus,
    Intent::ReturnPolicy,
];

#[derive(Clone, Debug, PartialEq)]
pub struct RoutingDecision {
    pub result: ClassificationResult,
    pub used_brain: bool,
}

/// Arbitrates between the guardrail and the brain, applies the deterministic
/// overrides, and persists the resolved intent and filters to session state.
pub struct DecisionRouter {
    config: RoutingConfig,
    availability: AvailabilityOverride,
    brain: Arc<dyn Reasoner>,
    store: Arc<dyn SessionStore>,
}

impl DecisionRouter {
    pub fn new(
        config: RoutingConfig,
        brain: Arc<dyn Reasoner>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let availability = AvailabilityOverride::from_config(&config);
        Self { config, availability, brain, store }
    }

    pub async fn route(
        &self,
        guardrail_result: ClassificationResult,
        raw_utterance: &str,
        session_id: &str,
        history: &[ContextMessage],
    ) -> Result<RoutingDecision> {
        let mut result = guardrail_result;

        // Deterministic override for implicit availability questions. Runs
        // before the fast-path checks are finalized and never touches the
        // confidence number.
        if result.confidence < self.config.availability_ceiling
            || result.intent == Intent::Unclear
        {
            if let Some(term) = self.availability.extract(raw_utterance) {
                tracing::debug!(
                    event_name = "router.availability_override",
                    search_term = %term,
                    "availability pattern forced product search"
                );
                result.intent = Intent::ProductSearch;
                result.entities.search_term = Some(term);
            }
        }

        let is_high_confidence = result.confidence > self.config.high_confidence;
        let is_trivial = TRIVIAL_INTENTS.contains(&result.intent)
            && result.confidence > self.config.trivial_confidence;

        // Navigation backfill: a destination hit counts as high confidence.
        let mut navigation_has_entity = false;
        if result.intent == Intent::NavigationHelp {
            if result.entities.destination.is_none() {
                result.entities.destination = match_destination(&normalize(raw_utterance));
            }
            navigation_has_entity = result.entities.destination.is_some();
        }

        // A concrete search term is a stronger signal than the score, once
        // leaked trigger words are stripped back out of it.
        let mut product_search_has_entity = false;
        if result.intent == Intent::ProductSearch {
            if let Some(term) = result.entities.search_term.take() {
                let cleaned = self.availability.strip_triggers(&term);
                if !cleaned.is_empty() {
                    result.entities.search_term = Some(cleaned);
                    product_search_has_entity = true;
                }
            }
        }

        let mut used_brain = false;
        if !(is_high_confidence
            || is_trivial
            || navigation_has_entity
            || product_search_has_entity)
        {
            let verdict = self.brain.reason(raw_utterance, history).await;
            result = ClassificationResult::new(
                verdict.intent,
                verdict.confidence,
                verdict.entities,
                raw_utterance,
            );
            used_brain = true;
        }

        tracing::info!(
            event_name = "router.turn_routed",
            session_id,
            intent = %result.intent,
            confidence = result.confidence,
            used_brain,
            "turn routed"
        );

        self.persist(session_id, &result).await?;
        Ok(RoutingDecision { result, used_brain })
    }

    async fn persist(&self, session_id: &str, result: &ClassificationResult) -> Result<()> {
        let mut patch = StatePatch { last_intent: Some(result.intent), ..StatePatch::default() };

        if result.intent == Intent::ProductSearch && !result.entities.is_empty() {
            let state = self.store.get_state(session_id).await?;
            let mut filters = state.filters;
            filters.merge_entities(&result.entities);
            patch.filters = Some(filters);
        }

        self.store.update_state(session_id, patch).await?;
        Ok(())
    }
}

/// "¿tienen mochilas?" style questions the statistical classifier
/// under-recognizes. The trigger and placeholder vocabularies are hand-tuned
/// configuration, matched over accent-stripped text.
struct AvailabilityOverride {
    pattern: Regex,
    trigger_words: Vec<String>,
    placeholders: Vec<String>,
}

impl AvailabilityOverride {
    fn from_config(config: &RoutingConfig) -> Self {
        // Longest trigger first so "do you have" wins over a bare "have".
        let mut triggers = config.availability_triggers.clone();
        triggers.sort_by_key(|trigger| std::cmp::Reverse(trigger.len()));
        let alternation =
            triggers.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&format!(r"(?:^|\s)(?:{alternation})\s+(.+)$"))
            .expect("valid availability pattern");

        let trigger_words = triggers
            .iter()
            .flat_map(|trigger| trigger.split_whitespace())
            .map(str::to_string)
            .collect();

        Self { pattern, trigger_words, placeholders: config.availability_placeholders.clone() }
    }

    /// The candidate search term, or None when the tail is too short or a
    /// generic placeholder.
    fn extract(&self, raw_utterance: &str) -> Option<String> {
        let normalized = normalize(raw_utterance);
        let capture = self.pattern.captures(&normalized)?;
        let tail = capture.get(1)?.as_str().trim();

        let term = tail
            .split_whitespace()
            .filter(|word| !matches!(*word, "de" | "la" | "el" | "las" | "los" | "una" | "un"))
            .collect::<Vec<_>>()
            .join(" ");

        if term.len() <= 2 {
            return None;
        }
        if self.placeholders.iter().any(|placeholder| placeholder == &term) {
            return None;
        }
        Some(term)
    }

    /// Remove trigger vocabulary the classifier over-captured inside a term.
    fn strip_triggers(&self, term: &str) -> String {
        normalize(term)
            .split_whitespace()
            .filter(|word| !self.trigger_words.iter().any(|trigger| trigger == word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
