use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use mercabot_core::{ChatResponse, Entities, Intent};
use mercabot_session::SessionStore;

/// Everything a handler may look at for one turn. Handlers mutate session
/// state only through the store handle.
pub struct HandlerContext<'a> {
    pub session_id: &'a str,
    pub user_id: Option<&'a str>,
    pub message: &'a str,
    pub entities: &'a Entities,
    pub store: &'a dyn SessionStore,
}

#[async_trait]
pub trait IntentHandler: Send + Sync {
    async fn execute(&self, ctx: HandlerContext<'_>) -> Result<ChatResponse>;
}

/// One handler per intent. Construction registers every variant; a lookup
/// that still misses falls back to the `Unclear` handler so dispatch always
/// produces a response.
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn IntentHandler>>,
    fallback: Arc<dyn IntentHandler>,
}

impl HandlerRegistry {
    pub fn new(fallback: Arc<dyn IntentHandler>) -> Self {
        Self { handlers: HashMap::new(), fallback }
    }

    pub fn register(&mut self, intent: Intent, handler: Arc<dyn IntentHandler>) {
        self.handlers.insert(intent, handler);
    }

    pub fn resolve(&self, intent: Intent) -> Arc<dyn IntentHandler> {
        self.handlers.get(&intent).cloned().unwrap_or_else(|| self.fallback.clone())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;

    use mercabot_core::{ChatResponse, Intent};

    use super::{HandlerContext, HandlerRegistry, IntentHandler};

    struct Canned(&'static str);

    #[async_trait]
    impl IntentHandler for Canned {
        async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
            Ok(ChatResponse::text(self.0))
        }
    }

    #[tokio::test]
    async fn unknown_intent_resolves_to_the_fallback() {
        use chrono::Duration;
        use mercabot_core::Entities;
        use mercabot_session::InMemorySessionStore;

        let mut registry = HandlerRegistry::new(Arc::new(Canned("fallback")));
        registry.register(Intent::Greeting, Arc::new(Canned("hola")));
        assert_eq!(registry.len(), 1);

        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        let entities = Entities::default();
        let ctx = || HandlerContext {
            session_id: "s1",
            user_id: None,
            message: "x",
            entities: &entities,
            store: &store,
        };

        let greeting = registry.resolve(Intent::Greeting).execute(ctx()).await;
        assert_eq!(greeting.expect("greeting").text, "hola");

        let other = registry.resolve(Intent::Returns).execute(ctx()).await;
        assert_eq!(other.expect("fallback").text, "fallback");
    }
}
