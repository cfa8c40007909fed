//! Two-tier intent inference and arbitration.
//!
//! This crate is the reasoning half of mercabot:
//! - **Guardrail** (`guardrail`) is the fast tier: weighted-keyword scoring
//!   over a fixed vocabulary plus entity extraction, pure local CPU work.
//! - **Brain** (`brain`) is the slow tier: an LLM asked to reason briefly and
//!   emit strict JSON, with a scrape parser for malformed output. Invoked only
//!   when the router decides the fast tier is not trustworthy.
//! - **Router** (`router`) arbitrates between the two, applies the
//!   deterministic pattern overrides, cleans extracted entities, and persists
//!   the resulting intent and filters to session state.
//!
//! # Safety Principle
//!
//! The LLM is strictly a classifier of last resort. Its output is parsed
//! defensively, coerced into the closed intent vocabulary, and any transport
//! failure or timeout degrades to the same `UNCLEAR` shape a parse failure
//! produces. There is no path on which a model error crosses this crate's
//! boundary as an error.

pub mod brain;
pub mod guardrail;
pub mod llm;
pub mod prompt;
pub mod router;

pub use brain::{Brain, BrainVerdict, Reasoner};
pub use guardrail::GuardrailClassifier;
pub use llm::{HttpLlmClient, LlmClient};
pub use router::{DecisionRouter, RoutingDecision, TRIVIAL_INTENTS};
