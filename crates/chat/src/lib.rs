//! Turn pipeline for the mercabot assistant: handler registry, staged
//! product search, ordinal resolution, and the collaborator seams the
//! handlers call out through.

pub mod collab;
pub mod handlers;
pub mod ordinal;
pub mod registry;
pub mod search;
pub mod service;

pub use handlers::{default_registry, HandlerDeps};
pub use registry::{HandlerContext, HandlerRegistry, IntentHandler};
pub use search::{SearchOutcome, SearchPipeline};
pub use service::{ChatService, ProcessedReply};
