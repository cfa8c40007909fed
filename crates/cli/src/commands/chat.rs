//! Interactive chat loop against the demo catalog and order fixtures.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mercabot_agent::{Brain, DecisionRouter, GuardrailClassifier, HttpLlmClient, LlmClient};
use mercabot_chat::collab::{InMemoryCatalog, InMemoryOrders, Order, OrderState};
use mercabot_chat::{default_registry, ChatService, HandlerDeps};
use mercabot_core::config::{AppConfig, LoadOptions};
use mercabot_core::{ChatResponse, ResponseContent};
use mercabot_session::InMemorySessionStore;

use super::CommandResult;

fn init_logging(config: &AppConfig) {
    use mercabot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn demo_orders(user: Option<&str>) -> InMemoryOrders {
    let Some(user) = user else {
        return InMemoryOrders::default();
    };
    InMemoryOrders::new(vec![
        (
            user.to_string(),
            Order {
                id: "o-demo-1".to_string(),
                number: "10021".to_string(),
                status: OrderState::Shipped,
                item_count: 2,
                total_cents: 51800,
                created_at: Utc::now() - Duration::days(3),
                delivered_at: None,
            },
        ),
        (
            user.to_string(),
            Order {
                id: "o-demo-2".to_string(),
                number: "10007".to_string(),
                status: OrderState::Delivered,
                item_count: 1,
                total_cents: 28900,
                created_at: Utc::now() - Duration::days(9),
                delivered_at: Some(Utc::now() - Duration::days(6)),
            },
        ),
    ])
}

fn build_service(config: &AppConfig, user: Option<&str>) -> ChatService {
    let store = Arc::new(InMemorySessionStore::new(&config.session));
    // Runs for the lifetime of the process; dropping the handle does not
    // cancel the task.
    let _sweeper = store.spawn_sweeper(StdDuration::from_secs(config.session.sweep_interval_secs));

    let brain = match HttpLlmClient::from_config(&config.llm) {
        Ok(client) => {
            let llm: Arc<dyn LlmClient> = Arc::new(client);
            Brain::new(Some(llm), StdDuration::from_secs(config.llm.timeout_secs))
        }
        Err(error) => {
            tracing::warn!(
                event_name = "cli.brain_disabled",
                error = %error,
                "deep reasoner unavailable, guardrail tier only"
            );
            Brain::disabled()
        }
    };

    let catalog = Arc::new(InMemoryCatalog::demo());
    let orders = Arc::new(demo_orders(user));
    let registry = default_registry(HandlerDeps {
        catalog: catalog.clone(),
        orders,
        generator: None,
        classifier: None,
        category_similarity: config.routing.category_similarity,
    });
    let router = DecisionRouter::new(config.routing.clone(), Arc::new(brain), store.clone());

    ChatService::new(GuardrailClassifier::new(), router, registry, store, catalog, None)
}

fn render(response: &ChatResponse) -> String {
    let mut out = format!("bot> {}", response.text);

    match &response.content {
        Some(ResponseContent::Products(items)) => {
            for (index, item) in items.iter().enumerate() {
                let brand = item.brand.as_deref().unwrap_or("-");
                out.push_str(&format!(
                    "\n  {}. {} ({brand}) ${:.2}",
                    index + 1,
                    item.name,
                    item.price_cents as f64 / 100.0
                ));
            }
        }
        Some(ResponseContent::Options(options)) => {
            for option in options {
                out.push_str(&format!("\n  - {option}"));
            }
        }
        Some(ResponseContent::Actions(actions)) => {
            for action in actions {
                match &action.url {
                    Some(url) => out.push_str(&format!("\n  [{}] -> {url}", action.text)),
                    None => out.push_str(&format!("\n  [{}]", action.text)),
                }
            }
        }
        Some(ResponseContent::OrderStatus(payload)) => {
            out.push_str(&format!(
                "\n  pedido {} | {} | {} articulos | ${:.2}",
                payload.order_id,
                payload.status,
                payload.item_count,
                payload.total_cents as f64 / 100.0
            ));
        }
        None => {}
    }

    if let Some(suggestions) = &response.suggested_actions {
        out.push_str(&format!("\n  ({})", suggestions.join(" | ")));
    }
    out
}

pub async fn run(user: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(format!("config error: {error}"), 2),
    };
    init_logging(&config);

    let service = build_service(&config, user);
    let mut session_id: Option<String> = None;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let banner = "mercabot listo. Escribe tu mensaje (\"salir\" para terminar).\n";
    if stdout.write_all(banner.as_bytes()).await.is_err() {
        return CommandResult::failure("stdout unavailable", 1);
    }

    loop {
        if stdout.write_all(b"tu> ").await.is_err() {
            break;
        }
        let _ = stdout.flush().await;

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                let _ = stdout.write_all(b"\nhasta luego\n").await;
                break;
            }
        };

        let Ok(Some(line)) = line else { break };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "salir" | "exit" | "quit") {
            let _ = stdout.write_all(b"hasta luego\n").await;
            break;
        }

        match service.process_message(message, user, session_id.as_deref()).await {
            Ok(reply) => {
                session_id = Some(reply.session_id.clone());
                let rendered = format!("{}\n", render(&reply.response));
                let _ = stdout.write_all(rendered.as_bytes()).await;
            }
            Err(error) => {
                tracing::error!(
                    event_name = "cli.turn_failed",
                    error = %error,
                    "turn failed at the session layer"
                );
                let _ = stdout.write_all(b"bot> algo fallo, intenta de nuevo\n").await;
            }
        }
    }

    CommandResult::success("")
}
