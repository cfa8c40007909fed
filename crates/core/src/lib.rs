//! Core domain types for the mercabot conversational engine.
//!
//! Everything in this crate is transport-agnostic and free of I/O: the closed
//! intent vocabulary, the classification result shape both inference tiers
//! produce, the per-session conversation state with its bounded message
//! history, the response envelope returned to the transport layer, and the
//! application configuration.
//!
//! # Safety Principle
//!
//! The intent vocabulary is closed. Any intent label arriving from outside
//! this crate (a model, a config file, a wire payload) that is not a
//! recognized member collapses to [`Intent::Unclear`]. Downstream code never
//! has to defend against an out-of-vocabulary intent.

pub mod config;
pub mod domain;
pub mod text;

pub use config::{AppConfig, ConfigError, LlmConfig, LoadOptions, RoutingConfig, SessionConfig};
pub use domain::classification::{ClassificationResult, Entities};
pub use domain::intent::Intent;
pub use domain::response::{
    ActionKind, ActionLink, ChatResponse, OrderStatusPayload, ProductSummary, ResponseContent,
    ResponseKind,
};
pub use domain::session::{
    ContextMessage, ConversationContext, ConversationState, DialogStep, Role, SearchFilters,
    CONTEXT_WINDOW,
};
