//! Canned conversational handlers. No collaborators, no state writes.

use anyhow::Result;
use async_trait::async_trait;

use mercabot_core::{ActionLink, ChatResponse};

use crate::registry::{HandlerContext, IntentHandler};

pub struct GreetingHandler;

#[async_trait]
impl IntentHandler for GreetingHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::options(
            "¡Hola! Soy el asistente de Mercalia. ¿En qué te puedo ayudar hoy?",
            vec![
                "Buscar productos".to_string(),
                "Rastrear mi pedido".to_string(),
                "Ver ofertas".to_string(),
                "Hablar con un agente".to_string(),
            ],
        ))
    }
}

pub struct GratitudeHandler;

#[async_trait]
impl IntentHandler for GratitudeHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::text("¡Con gusto! Si necesitas algo más, aquí estoy.")
            .with_suggestions(vec![
                "Buscar productos".to_string(),
                "Ver mis pedidos".to_string(),
            ]))
    }
}

pub struct GeneralHelpHandler;

#[async_trait]
impl IntentHandler for GeneralHelpHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::options(
            "Puedo ayudarte con varias cosas. Elige una opción o escríbeme lo que necesitas:",
            vec![
                "Buscar productos".to_string(),
                "Estado de mi pedido".to_string(),
                "Devoluciones".to_string(),
                "Cómo comprar".to_string(),
                "Hablar con un agente".to_string(),
            ],
        ))
    }
}

pub struct OutOfScopeHandler;

#[async_trait]
impl IntentHandler for OutOfScopeHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::text(
            "Eso se sale un poco de lo que manejo. Te puedo ayudar con productos, pedidos y devoluciones de Mercalia.",
        )
        .with_suggestions(vec![
            "Buscar productos".to_string(),
            "Ver mis pedidos".to_string(),
        ]))
    }
}

pub struct HumanEscalationHandler;

#[async_trait]
impl IntentHandler for HumanEscalationHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::actions(
            "Claro, te conecto con nuestro equipo de soporte. También puedes escribirnos directamente:",
            vec![
                ActionLink::navigate("Abrir chat de soporte", "/support/chat"),
                ActionLink::navigate("Enviar un correo", "/support/email"),
                ActionLink::message("Seguir con el asistente"),
            ],
        ))
    }
}

/// Dispatch fallback: final destination for unresolved utterances and for
/// any intent that somehow lacks a registered handler.
pub struct UnclearHandler;

#[async_trait]
impl IntentHandler for UnclearHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::options(
            "No estoy seguro de haber entendido. ¿Alguna de estas opciones se acerca a lo que buscas?",
            vec![
                "Buscar productos".to_string(),
                "Estado de mi pedido".to_string(),
                "Devoluciones".to_string(),
                "Hablar con un agente".to_string(),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use mercabot_core::{Entities, ResponseKind};
    use mercabot_session::InMemorySessionStore;

    use super::{GreetingHandler, HumanEscalationHandler, UnclearHandler};
    use crate::registry::{HandlerContext, IntentHandler};

    async fn run(handler: &dyn IntentHandler) -> mercabot_core::ChatResponse {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        let entities = Entities::default();
        handler
            .execute(HandlerContext {
                session_id: "s1",
                user_id: None,
                message: "hola",
                entities: &entities,
                store: &store,
            })
            .await
            .expect("handler")
    }

    #[tokio::test]
    async fn greeting_offers_options() {
        let response = run(&GreetingHandler).await;
        assert_eq!(response.kind, ResponseKind::Options);
    }

    #[tokio::test]
    async fn escalation_carries_navigation_actions() {
        let response = run(&HumanEscalationHandler).await;
        assert_eq!(response.kind, ResponseKind::Actions);
    }

    #[tokio::test]
    async fn unclear_reply_suggests_known_paths() {
        let response = run(&UnclearHandler).await;
        assert_eq!(response.kind, ResponseKind::Options);
    }
}
