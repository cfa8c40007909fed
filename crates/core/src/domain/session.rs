use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::classification::Entities;
use crate::domain::intent::Intent;

/// Maximum number of messages retained per conversation.
pub const CONTEXT_WINDOW: usize = 10;

/// Coarse cross-turn dialog position, advanced only by specific handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogStep {
    Idle,
    ShowingResults,
    ShowingDetails,
    AwaitingConfirmation,
}

impl Default for DialogStep {
    fn default() -> Self {
        Self::Idle
    }
}

/// Accumulated search constraints, persisted across turns so the user is not
/// re-asked for settled filters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub search_term: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.search_term.is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.color.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Fold freshly extracted entities in, last-write-wins per field.
    pub fn merge_entities(&mut self, entities: &Entities) {
        if entities.search_term.is_some() {
            self.search_term = entities.search_term.clone();
        }
        if entities.category.is_some() {
            self.category = entities.category.clone();
        }
        if entities.brand.is_some() {
            self.brand = entities.brand.clone();
        }
        if entities.color.is_some() {
            self.color = entities.color.clone();
        }
        if entities.min_price.is_some() {
            self.min_price = entities.min_price;
        }
        if entities.max_price.is_some() {
            self.max_price = entities.max_price;
        }
    }
}

/// Mutable per-session state, owned exclusively by the session store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub last_intent: Option<Intent>,
    pub filters: SearchFilters,
    pub step: DialogStep,
    /// Product identifiers from the most recent result listing, in display
    /// order. Ordinal references ("el primero") resolve against this.
    pub last_products_shown: Vec<String>,
    pub pending_action: Option<String>,
    pub last_activity_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            last_intent: None,
            filters: SearchFilters::default(),
            step: DialogStep::Idle,
            last_products_shown: Vec::new(),
            pending_action: None,
            last_activity_at: Utc::now(),
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub text: String,
    pub intent: Option<Intent>,
    pub timestamp: DateTime<Utc>,
}

/// Bounded message history, newest last. Pushing beyond [`CONTEXT_WINDOW`]
/// drops the oldest entries first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    messages: Vec<ContextMessage>,
}

impl ConversationContext {
    pub fn push(&mut self, role: Role, text: impl Into<String>, intent: Option<Intent>) {
        self.messages.push(ContextMessage {
            role,
            text: text.into(),
            intent,
            timestamp: Utc::now(),
        });
        if self.messages.len() > CONTEXT_WINDOW {
            let overflow = self.messages.len() - CONTEXT_WINDOW;
            self.messages.drain(..overflow);
        }
    }

    pub fn messages(&self) -> &[ContextMessage] {
        &self.messages
    }

    /// The newest `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[ContextMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationContext, Role, CONTEXT_WINDOW};

    #[test]
    fn context_is_capped_and_drops_oldest_first() {
        let mut context = ConversationContext::default();
        for i in 0..25 {
            context.push(Role::User, format!("message {i}"), None);
        }

        assert_eq!(context.len(), CONTEXT_WINDOW);
        assert_eq!(context.messages()[0].text, "message 15");
        assert_eq!(context.messages()[CONTEXT_WINDOW - 1].text, "message 24");
    }

    #[test]
    fn recent_returns_newest_slice_in_order() {
        let mut context = ConversationContext::default();
        for i in 0..8 {
            context.push(Role::Bot, format!("m{i}"), None);
        }

        let recent = context.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].text, "m5");
        assert_eq!(recent[2].text, "m7");
    }

    #[test]
    fn recent_with_large_n_returns_everything() {
        let mut context = ConversationContext::default();
        context.push(Role::User, "solo", None);
        assert_eq!(context.recent(50).len(), 1);
    }
}
