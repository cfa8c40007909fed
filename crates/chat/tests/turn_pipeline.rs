//! End-to-end turns through the full service: guardrail, router, handlers,
//! session persistence, and the notification hook, with the reasoner
//! disabled so every path is deterministic.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;

use mercabot_agent::{Brain, DecisionRouter, GuardrailClassifier};
use mercabot_chat::collab::{InMemoryCatalog, InMemoryOrders, RecordingNotifier};
use mercabot_chat::{default_registry, ChatService, HandlerDeps, HandlerRegistry};
use mercabot_core::{AppConfig, ChatResponse, Intent, ResponseContent, ResponseKind, Role};
use mercabot_session::{InMemorySessionStore, SessionStore};

struct Fixture {
    service: ChatService,
    store: Arc<InMemorySessionStore>,
    orders: Arc<InMemoryOrders>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture() -> Fixture {
    fixture_with_registry(None)
}

fn fixture_with_registry(registry: Option<HandlerRegistry>) -> Fixture {
    let routing = AppConfig::default().routing;
    let store = Arc::new(InMemorySessionStore::with_ttl(Duration::minutes(30)));
    let catalog = Arc::new(InMemoryCatalog::demo());
    let orders = Arc::new(InMemoryOrders::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let registry = registry.unwrap_or_else(|| {
        default_registry(HandlerDeps {
            catalog: catalog.clone(),
            orders: orders.clone(),
            generator: None,
            classifier: None,
            category_similarity: routing.category_similarity,
        })
    });

    let router = DecisionRouter::new(routing, Arc::new(Brain::disabled()), store.clone());
    let service = ChatService::new(
        GuardrailClassifier::new(),
        router,
        registry,
        store.clone(),
        catalog,
        Some(notifier.clone()),
    );

    Fixture { service, store, orders, notifier }
}

async fn wait_for_notifications(notifier: &RecordingNotifier, count: usize) {
    for _ in 0..100 {
        if notifier.events().len() >= count {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    panic!("expected {count} notifications, got {}", notifier.events().len());
}

#[tokio::test]
async fn greeting_turn_on_a_fresh_session() {
    let fx = fixture();
    let reply = fx.service.process_message("¡Hola!", None, None).await.expect("turn");

    assert_eq!(reply.intent, Intent::Greeting);
    assert!(!reply.used_brain);
    assert!(reply.session_id.starts_with("sess-"));
    assert_eq!(reply.response.kind, ResponseKind::Options);

    // Both sides of the exchange are in context before the call returns.
    let context = fx
        .store
        .get_context(&reply.session_id)
        .await
        .expect("context")
        .expect("created");
    assert_eq!(context.len(), 2);
    assert_eq!(context.messages()[0].role, Role::User);
    assert_eq!(context.messages()[1].role, Role::Bot);
    assert_eq!(context.messages()[1].intent, Some(Intent::Greeting));
}

#[tokio::test]
async fn search_then_ordinal_reference_resolves_the_first_product() {
    let fx = fixture();

    let first = fx
        .service
        .process_message("busco una mochila", None, Some("s-ord"))
        .await
        .expect("turn");
    assert_eq!(first.intent, Intent::ProductSearch);
    assert_eq!(first.response.kind, ResponseKind::Products);

    let second = fx
        .service
        .process_message("el primero", None, Some("s-ord"))
        .await
        .expect("turn");
    assert_eq!(second.intent, Intent::ProductSearch);
    match second.response.content {
        Some(ResponseContent::Products(items)) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].sku, "MOCH-AZ-20");
        }
        other => panic!("expected product details, got {other:?}"),
    }
}

#[tokio::test]
async fn availability_question_becomes_a_product_search() {
    let fx = fixture();
    let reply = fx
        .service
        .process_message("¿tienen mochilas?", None, Some("s-avail"))
        .await
        .expect("turn");

    assert_eq!(reply.intent, Intent::ProductSearch);
    assert!(!reply.used_brain);
    assert_eq!(reply.response.kind, ResponseKind::Products);
}

#[tokio::test]
async fn plural_search_term_finds_singular_products() {
    let fx = fixture();
    let reply = fx
        .service
        .process_message("busco lápices", None, Some("s-sing"))
        .await
        .expect("turn");

    assert_eq!(reply.intent, Intent::ProductSearch);
    match reply.response.content {
        Some(ResponseContent::Products(items)) => {
            assert_eq!(items[0].sku, "LAP-HB-12");
        }
        other => panic!("expected products, got {other:?}"),
    }
}

#[tokio::test]
async fn anonymous_order_tracking_never_reaches_the_order_backend() {
    let fx = fixture();
    let reply = fx
        .service
        .process_message("¿dónde está mi pedido?", None, Some("s-track"))
        .await
        .expect("turn");

    assert_eq!(reply.intent, Intent::OrderTracking);
    assert_eq!(reply.response.kind, ResponseKind::Actions);
    assert_eq!(fx.orders.call_count(), 0);
}

#[tokio::test]
async fn unresolvable_utterance_without_a_brain_lands_on_unclear() {
    let fx = fixture();
    let reply = fx
        .service
        .process_message("qwrty plomk zzz", None, Some("s-unk"))
        .await
        .expect("turn");

    assert_eq!(reply.intent, Intent::Unclear);
    assert!(reply.used_brain);
    assert_eq!(reply.response.kind, ResponseKind::Options);
}

struct ExplodingHandler;

#[async_trait]
impl mercabot_chat::IntentHandler for ExplodingHandler {
    async fn execute(
        &self,
        _ctx: mercabot_chat::HandlerContext<'_>,
    ) -> Result<ChatResponse> {
        anyhow::bail!("backing service exploded")
    }
}

#[tokio::test]
async fn handler_failure_degrades_to_the_apology_envelope() {
    let mut registry = HandlerRegistry::new(Arc::new(ExplodingHandler));
    registry.register(Intent::Greeting, Arc::new(ExplodingHandler));
    let fx = fixture_with_registry(Some(registry));

    let reply = fx
        .service
        .process_message("hola", None, Some("s-boom"))
        .await
        .expect("turn still succeeds");

    assert_eq!(reply.response, ChatResponse::apology());

    // The apology is still recorded as the bot side of the exchange.
    let context = fx.store.get_context("s-boom").await.expect("context").expect("created");
    assert_eq!(context.len(), 2);
}

#[tokio::test]
async fn each_turn_emits_one_notification() {
    let fx = fixture();
    fx.service.process_message("hola", Some("u-1"), Some("s-notif")).await.expect("turn");

    wait_for_notifications(&fx.notifier, 1).await;
    let events = fx.notifier.events();
    assert_eq!(events[0].session_id, "s-notif");
    assert_eq!(events[0].intent, Intent::Greeting);
    assert_eq!(events[0].user_id.as_deref(), Some("u-1"));
}
