use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use mercabot_core::text::normalize;
use mercabot_core::{ChatResponse, DialogStep, ProductSummary};
use mercabot_session::StatePatch;

use crate::collab::TextGenerator;
use crate::registry::{HandlerContext, IntentHandler};
use crate::search::{SearchOutcome, SearchPipeline};

/// Terms too vague to search with. These get an invitation to narrow down
/// instead of a pointless full-catalog query.
const GENERIC_TERMS: &[&str] = &[
    "algo",
    "producto",
    "productos",
    "articulo",
    "articulos",
    "cosas",
    "buscar",
    "ver productos",
    "comprar",
    "something",
    "products",
];

pub struct ProductSearchHandler {
    pipeline: SearchPipeline,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl ProductSearchHandler {
    pub fn new(pipeline: SearchPipeline, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { pipeline, generator }
    }

    fn is_generic(term: Option<&str>) -> bool {
        match term {
            None => true,
            Some(term) => {
                let term = normalize(term);
                term.is_empty() || GENERIC_TERMS.iter().any(|generic| *generic == term)
            }
        }
    }

    /// A search invitation, model-written when a generator is wired in,
    /// otherwise (or on failure) a fixed multiple-choice prompt.
    async fn invitation(&self) -> ChatResponse {
        if let Some(generator) = &self.generator {
            let prompt = "Escribe una invitación breve y amable, en español, para que un cliente \
                          de una tienda de útiles escolares y de oficina describa qué producto \
                          busca. Una sola frase, sin comillas.";
            match generator.generate(prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    return ChatResponse::options(
                        text.trim().to_string(),
                        static_categories(),
                    );
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(
                        event_name = "search.invitation_failed",
                        error = %error,
                        "invitation generation failed, using static prompt"
                    );
                }
            }
        }
        ChatResponse::options(
            "¡Claro! ¿Qué tipo de producto estás buscando?",
            static_categories(),
        )
    }

    fn phrase(outcome: &SearchOutcome, term: Option<&str>) -> String {
        let shown = outcome.items().len();
        match outcome {
            SearchOutcome::Exact(_) => match term {
                Some(term) => format!("Encontré {shown} resultados para \"{term}\":"),
                None => format!("Encontré {shown} resultados:"),
            },
            SearchOutcome::Singularized { term, .. } => {
                format!("Encontré {shown} resultados para \"{term}\":")
            }
            SearchOutcome::Category { name, .. } => {
                format!("No encontré ese producto exacto, pero esto tenemos en {name}:")
            }
            SearchOutcome::Empty => String::new(),
        }
    }
}

fn static_categories() -> Vec<String> {
    vec![
        "Mochilas".to_string(),
        "Cuadernos".to_string(),
        "Escritura".to_string(),
        "Calculadoras".to_string(),
        "Arte y manualidades".to_string(),
    ]
}

fn no_results(term: Option<&str>) -> ChatResponse {
    let text = match term {
        Some(term) => format!(
            "No encontré resultados para \"{term}\". Prueba con otra palabra o revisa el catálogo completo."
        ),
        None => "No encontré resultados. Prueba con otra palabra o revisa el catálogo completo."
            .to_string(),
    };
    ChatResponse::text(text).with_suggestions(vec![
        "Ver catálogo".to_string(),
        "Ver ofertas".to_string(),
        "Hablar con un agente".to_string(),
    ])
}

#[async_trait]
impl IntentHandler for ProductSearchHandler {
    async fn execute(&self, ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        // The router has already merged this turn's entities into the
        // session filters; search with the accumulated constraints.
        let state = ctx.store.get_state(ctx.session_id).await?;
        let mut filters = state.filters.clone();

        // A generic term carries no signal; drop it and search on whatever
        // concrete filters remain, or invite the user to narrow down.
        if Self::is_generic(filters.search_term.as_deref()) {
            filters.search_term = None;
            if filters.is_empty() {
                return Ok(self.invitation().await);
            }
        }
        let term = filters.search_term.clone();
        let term = term.as_deref();

        let outcome = self.pipeline.run(&filters).await?;
        if outcome.items().is_empty() {
            return Ok(no_results(term));
        }

        let items: Vec<ProductSummary> = outcome.items().to_vec();
        let shown: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
        ctx.store
            .update_state(
                ctx.session_id,
                StatePatch {
                    step: Some(DialogStep::ShowingResults),
                    last_products_shown: Some(shown),
                    ..StatePatch::default()
                },
            )
            .await?;

        Ok(ChatResponse::products(Self::phrase(&outcome, term), items)
            .with_suggestions(vec![
                "Ver el primero".to_string(),
                "Filtrar por precio".to_string(),
            ]))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::Duration;

    use mercabot_core::{DialogStep, Entities, ResponseKind, SearchFilters};
    use mercabot_session::{InMemorySessionStore, SessionStore, StatePatch};

    use super::ProductSearchHandler;
    use crate::collab::{InMemoryCatalog, TextGenerator};
    use crate::registry::{HandlerContext, IntentHandler};
    use crate::search::SearchPipeline;

    struct BrokenGenerator;

    #[async_trait]
    impl TextGenerator for BrokenGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            bail!("generation backend down")
        }
    }

    fn handler(generator: Option<Arc<dyn TextGenerator>>) -> ProductSearchHandler {
        let pipeline = SearchPipeline::new(Arc::new(InMemoryCatalog::demo()), None, 0.3);
        ProductSearchHandler::new(pipeline, generator)
    }

    async fn seed_filters(store: &InMemorySessionStore, session_id: &str, term: Option<&str>) {
        let filters = SearchFilters {
            search_term: term.map(str::to_string),
            ..SearchFilters::default()
        };
        store
            .update_state(session_id, StatePatch { filters: Some(filters), ..StatePatch::default() })
            .await
            .expect("seed");
    }

    async fn run(
        handler: &ProductSearchHandler,
        store: &InMemorySessionStore,
        message: &str,
    ) -> mercabot_core::ChatResponse {
        let entities = Entities::default();
        handler
            .execute(HandlerContext {
                session_id: "s1",
                user_id: None,
                message,
                entities: &entities,
                store,
            })
            .await
            .expect("handler")
    }

    #[tokio::test]
    async fn concrete_term_returns_products_and_advances_the_dialog() {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        seed_filters(&store, "s1", Some("mochila")).await;

        let response = run(&handler(None), &store, "quiero una mochila").await;
        assert_eq!(response.kind, ResponseKind::Products);

        let state = store.get_state("s1").await.expect("state");
        assert_eq!(state.step, DialogStep::ShowingResults);
        assert_eq!(state.last_products_shown.len(), 2);
    }

    #[tokio::test]
    async fn generic_term_without_generator_uses_static_invitation() {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        seed_filters(&store, "s1", Some("algo")).await;

        let response = run(&handler(None), &store, "quiero comprar algo").await;
        assert_eq!(response.kind, ResponseKind::Options);
    }

    #[tokio::test]
    async fn failing_generator_falls_back_to_static_invitation() {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        seed_filters(&store, "s1", None).await;

        let response = run(&handler(Some(Arc::new(BrokenGenerator))), &store, "buscar").await;
        assert_eq!(response.kind, ResponseKind::Options);
        assert!(response.text.contains("buscando"));
    }

    #[tokio::test]
    async fn unknown_term_yields_no_results_text() {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        seed_filters(&store, "s1", Some("telescopio")).await;

        let response = run(&handler(None), &store, "telescopio").await;
        assert_eq!(response.kind, ResponseKind::Text);
        assert!(response.text.contains("telescopio"));

        let state = store.get_state("s1").await.expect("state");
        assert_eq!(state.step, DialogStep::Idle);
        assert!(state.last_products_shown.is_empty());
    }

    #[tokio::test]
    async fn generic_term_with_concrete_filters_still_searches() {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        let filters = SearchFilters {
            search_term: Some("algo".to_string()),
            color: Some("rojo".to_string()),
            ..SearchFilters::default()
        };
        store
            .update_state("s1", StatePatch { filters: Some(filters), ..StatePatch::default() })
            .await
            .expect("seed");

        // A generic term with a real color filter should not re-invite.
        let response = run(&handler(None), &store, "algo rojo").await;
        assert_ne!(response.kind, ResponseKind::Options);
    }
}
