use async_trait::async_trait;
use thiserror::Error;

use mercabot_core::{
    ConversationContext, ConversationState, DialogStep, Intent, Role, SearchFilters,
};

/// Transport-level failure of a session backend. The in-memory store never
/// produces one; a remote cache implementation would.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session backend unavailable: {0}")]
    Backend(String),
}

/// Partial update applied by [`SessionStore::update_state`]. Only fields that
/// are `Some` change; `pending_action` is doubly wrapped so it can be
/// explicitly cleared.
#[derive(Clone, Debug, Default)]
pub struct StatePatch {
    pub last_intent: Option<Intent>,
    pub filters: Option<SearchFilters>,
    pub step: Option<DialogStep>,
    pub last_products_shown: Option<Vec<String>>,
    pub pending_action: Option<Option<String>>,
}

impl StatePatch {
    pub fn apply(self, state: &mut ConversationState) {
        if let Some(last_intent) = self.last_intent {
            state.last_intent = Some(last_intent);
        }
        if let Some(filters) = self.filters {
            state.filters = filters;
        }
        if let Some(step) = self.step {
            state.step = step;
        }
        if let Some(last_products_shown) = self.last_products_shown {
            state.last_products_shown = last_products_shown;
        }
        if let Some(pending_action) = self.pending_action {
            state.pending_action = pending_action;
        }
    }
}

/// The session storage contract. Callers must not assume in-process locality;
/// every operation is potentially a remote call.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates-on-miss: an unknown session id yields a fresh default state.
    async fn get_state(&self, session_id: &str) -> Result<ConversationState, StoreError>;

    async fn save_state(
        &self,
        session_id: &str,
        state: ConversationState,
    ) -> Result<(), StoreError>;

    /// Read-modify-write; bumps `last_activity_at` and slides the TTL.
    async fn update_state(
        &self,
        session_id: &str,
        patch: StatePatch,
    ) -> Result<ConversationState, StoreError>;

    async fn get_context(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationContext>, StoreError>;

    /// Appends a message, truncating the history to the newest
    /// [`mercabot_core::CONTEXT_WINDOW`] entries.
    async fn add_message(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
        intent: Option<Intent>,
    ) -> Result<(), StoreError>;

    async fn clear_session(&self, session_id: &str) -> Result<(), StoreError>;
}
