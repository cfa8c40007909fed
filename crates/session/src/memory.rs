use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use mercabot_core::config::SessionConfig;
use mercabot_core::{ConversationContext, ConversationState, Intent, Role};

use crate::store::{SessionStore, StatePatch, StoreError};

struct Entry<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Entry<T> {
    fn live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-process session store: two independent expiring maps plus a detached
/// sweep task. Every write renews the entry's TTL; reads never do.
pub struct InMemorySessionStore {
    states: RwLock<HashMap<String, Entry<ConversationState>>>,
    contexts: RwLock<HashMap<String, Entry<ConversationContext>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_ttl(Duration::seconds(config.ttl_secs as i64))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { states: RwLock::new(HashMap::new()), contexts: RwLock::new(HashMap::new()), ttl }
    }

    fn expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.ttl
    }

    /// Delete every expired entry from both maps. Returns the eviction count.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut evicted = 0usize;

        {
            let mut states = self.states.write().await;
            let before = states.len();
            states.retain(|_, entry| entry.live(now));
            evicted += before - states.len();
        }
        {
            let mut contexts = self.contexts.write().await;
            let before = contexts.len();
            contexts.retain(|_, entry| entry.live(now));
            evicted += before - contexts.len();
        }

        debug!(event_name = "session.sweep.completed", evicted, "session sweep completed");
        evicted
    }

    /// Spawn the periodic eviction sweep as a detached task.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: StdDuration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let evicted = store.sweep_expired().await;
                if evicted > 0 {
                    info!(
                        event_name = "session.sweep.evicted",
                        evicted, "expired sessions evicted"
                    );
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_state(&self, session_id: &str) -> Result<ConversationState, StoreError> {
        let now = Utc::now();
        {
            let states = self.states.read().await;
            if let Some(entry) = states.get(session_id) {
                if entry.live(now) {
                    return Ok(entry.value.clone());
                }
            }
        }

        // First reference (or lapsed entry): materialize an empty state.
        let state = ConversationState::new();
        let mut states = self.states.write().await;
        states.insert(
            session_id.to_string(),
            Entry { value: state.clone(), expires_at: self.expiry() },
        );
        Ok(state)
    }

    async fn save_state(
        &self,
        session_id: &str,
        state: ConversationState,
    ) -> Result<(), StoreError> {
        let mut states = self.states.write().await;
        states.insert(session_id.to_string(), Entry { value: state, expires_at: self.expiry() });
        Ok(())
    }

    async fn update_state(
        &self,
        session_id: &str,
        patch: StatePatch,
    ) -> Result<ConversationState, StoreError> {
        let now = Utc::now();
        let mut states = self.states.write().await;
        let mut state = match states.get(session_id) {
            Some(entry) if entry.live(now) => entry.value.clone(),
            _ => ConversationState::new(),
        };

        patch.apply(&mut state);
        state.last_activity_at = now;
        states.insert(
            session_id.to_string(),
            Entry { value: state.clone(), expires_at: self.expiry() },
        );
        Ok(state)
    }

    async fn get_context(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationContext>, StoreError> {
        let now = Utc::now();
        let contexts = self.contexts.read().await;
        Ok(contexts
            .get(session_id)
            .filter(|entry| entry.live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn add_message(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
        intent: Option<Intent>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut contexts = self.contexts.write().await;
        let mut context = match contexts.get(session_id) {
            Some(entry) if entry.live(now) => entry.value.clone(),
            _ => ConversationContext::default(),
        };

        context.push(role, text, intent);
        contexts.insert(
            session_id.to_string(),
            Entry { value: context, expires_at: self.expiry() },
        );
        Ok(())
    }

    async fn clear_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.states.write().await.remove(session_id);
        self.contexts.write().await.remove(session_id);
        Ok(())
    }
}
