//! One-turn orchestration: classify, route, dispatch, persist, notify.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use mercabot_agent::{DecisionRouter, GuardrailClassifier};
use mercabot_core::{ChatResponse, DialogStep, Intent, Role};
use mercabot_session::{SessionStore, StatePatch};

use crate::collab::{CatalogSearch, Notifier, TurnNotification};
use crate::ordinal;
use crate::registry::{HandlerContext, HandlerRegistry};

/// What one processed turn produced, session id included because the
/// service mints one when the caller did not supply it.
#[derive(Clone, Debug)]
pub struct ProcessedReply {
    pub response: ChatResponse,
    pub session_id: String,
    pub intent: Intent,
    pub used_brain: bool,
}

pub struct ChatService {
    guardrail: GuardrailClassifier,
    router: DecisionRouter,
    registry: HandlerRegistry,
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn CatalogSearch>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ChatService {
    pub fn new(
        guardrail: GuardrailClassifier,
        router: DecisionRouter,
        registry: HandlerRegistry,
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn CatalogSearch>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self { guardrail, router, registry, store, catalog, notifier }
    }

    /// Runs one full turn. Business-level problems (handler failures, vague
    /// input, missing data) always come back as a well-formed response;
    /// only session transport failures surface as `Err`.
    pub async fn process_message(
        &self,
        message: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ProcessedReply> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => mint_session_id(),
        };
        let correlation_id = Uuid::new_v4();

        tracing::debug!(
            event_name = "chat.turn.started",
            %correlation_id,
            session_id = %session_id,
            "processing inbound message"
        );

        // The user message goes into context first so the stored history is
        // complete even when this turn fails later.
        self.store.add_message(&session_id, Role::User, message, None).await?;

        // The brain must not see this turn's own message twice; it gets the
        // history as it stood before the append.
        let history = match self.store.get_context(&session_id).await? {
            Some(context) => {
                let messages = context.messages();
                let cut = messages
                    .iter()
                    .rposition(|m| m.role == Role::User && m.text == message)
                    .unwrap_or(messages.len());
                messages[..cut].to_vec()
            }
            None => Vec::new(),
        };

        let guardrail_result = self.guardrail.classify(message);

        if let Some(reply) = self.try_resolve_ordinal(&session_id, message).await? {
            self.store
                .add_message(&session_id, Role::Bot, &reply.text, Some(Intent::ProductSearch))
                .await?;
            self.notify_detached(&session_id, Intent::ProductSearch, false, user_id);
            return Ok(ProcessedReply {
                response: reply,
                session_id,
                intent: Intent::ProductSearch,
                used_brain: false,
            });
        }

        let decision = self
            .router
            .route(guardrail_result, message, &session_id, &history)
            .await?;
        let intent = decision.result.intent;

        let ctx = HandlerContext {
            session_id: &session_id,
            user_id,
            message,
            entities: &decision.result.entities,
            store: self.store.as_ref(),
        };
        let response = match self.registry.resolve(intent).execute(ctx).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(
                    event_name = "chat.turn.handler_failed",
                    %correlation_id,
                    session_id = %session_id,
                    intent = %intent,
                    error = %error,
                    "handler failed, degrading to apology"
                );
                ChatResponse::apology()
            }
        };

        self.store.add_message(&session_id, Role::Bot, &response.text, Some(intent)).await?;
        self.notify_detached(&session_id, intent, decision.used_brain, user_id);

        Ok(ProcessedReply {
            response,
            session_id,
            intent,
            used_brain: decision.used_brain,
        })
    }

    /// Deterministic "el primero" resolution against the last listing. Only
    /// fires while results are on screen; any miss falls back to routing.
    async fn try_resolve_ordinal(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<Option<ChatResponse>> {
        let state = self.store.get_state(session_id).await?;
        if state.step != DialogStep::ShowingResults || state.last_products_shown.is_empty() {
            return Ok(None);
        }
        let Some(index) = ordinal::resolve(message) else {
            return Ok(None);
        };
        let Some(product_id) = state.last_products_shown.get(index) else {
            return Ok(None);
        };
        let Some(product) = self.catalog.find_by_id(product_id).await? else {
            return Ok(None);
        };

        self.store
            .update_state(
                session_id,
                StatePatch {
                    step: Some(DialogStep::ShowingDetails),
                    last_intent: Some(Intent::ProductSearch),
                    ..StatePatch::default()
                },
            )
            .await?;

        let text = format!("Aquí tienes los detalles de {}:", product.name);
        Ok(Some(
            ChatResponse::products(text, vec![product]).with_suggestions(vec![
                "Agregar al carrito".to_string(),
                "Ver más resultados".to_string(),
            ]),
        ))
    }

    fn notify_detached(
        &self,
        session_id: &str,
        intent: Intent,
        used_brain: bool,
        user_id: Option<&str>,
    ) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let event = TurnNotification {
            session_id: session_id.to_string(),
            intent,
            used_brain,
            user_id: user_id.map(str::to_string),
        };
        tokio::spawn(async move {
            if let Err(error) = notifier.notify(event).await {
                tracing::warn!(
                    event_name = "chat.notify_failed",
                    error = %error,
                    "turn notification failed"
                );
            }
        });
    }
}

fn mint_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("sess-{}-{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::mint_session_id;

    #[test]
    fn minted_session_ids_are_well_formed_and_distinct() {
        let a = mint_session_id();
        let b = mint_session_id();

        assert!(a.starts_with("sess-"));
        let suffix = a.rsplit('-').next().expect("suffix");
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
