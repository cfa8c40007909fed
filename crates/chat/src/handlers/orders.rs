//! Order lookup handlers. Every one of them gates on authentication before
//! touching the order collaborator; an anonymous user gets a login prompt
//! and the backend is never called.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use mercabot_core::{ActionLink, ChatResponse, OrderStatusPayload};

use crate::collab::{Order, OrderService};
use crate::registry::{HandlerContext, IntentHandler};

static ORDER_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#?(\d{4,})").expect("valid order number pattern"));

fn login_prompt() -> ChatResponse {
    ChatResponse::actions(
        "Para consultar tus pedidos necesito que inicies sesión.",
        vec![
            ActionLink::navigate("Iniciar sesión", "/login"),
            ActionLink::navigate("Crear cuenta", "/register"),
        ],
    )
}

fn order_number_in(ctx: &HandlerContext<'_>) -> Option<String> {
    if let Some(value) = ctx.entities.extra.get("order_number") {
        if let Some(number) = value.as_str() {
            return Some(number.trim_start_matches('#').to_string());
        }
    }
    ORDER_NUMBER
        .captures(ctx.message)
        .and_then(|capture| capture.get(1))
        .map(|m| m.as_str().to_string())
}

fn status_payload(order: &Order) -> OrderStatusPayload {
    OrderStatusPayload {
        order_id: order.id.clone(),
        status: order.status.display_es().to_string(),
        item_count: order.item_count,
        total_cents: order.total_cents,
        created_at: order.created_at,
    }
}

async fn lookup(
    orders: &Arc<dyn OrderService>,
    ctx: &HandlerContext<'_>,
    user_id: &str,
) -> Result<Option<Order>> {
    if let Some(number) = order_number_in(ctx) {
        return orders.find_order(&number).await;
    }
    let mut found = orders.find_orders_by_user(user_id).await?;
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(found.into_iter().next())
}

pub struct OrderStatusHandler {
    orders: Arc<dyn OrderService>,
}

impl OrderStatusHandler {
    pub fn new(orders: Arc<dyn OrderService>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl IntentHandler for OrderStatusHandler {
    async fn execute(&self, ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        let Some(user_id) = ctx.user_id else {
            return Ok(login_prompt());
        };

        match lookup(&self.orders, &ctx, user_id).await? {
            Some(order) => Ok(ChatResponse::order_status(
                format!(
                    "Tu pedido {} está {}.",
                    order.number,
                    order.status.display_es()
                ),
                status_payload(&order),
            )),
            None => Ok(no_orders_found()),
        }
    }
}

pub struct OrderTrackingHandler {
    orders: Arc<dyn OrderService>,
}

impl OrderTrackingHandler {
    pub fn new(orders: Arc<dyn OrderService>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl IntentHandler for OrderTrackingHandler {
    async fn execute(&self, ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        let Some(user_id) = ctx.user_id else {
            return Ok(login_prompt());
        };

        match lookup(&self.orders, &ctx, user_id).await? {
            Some(order) => {
                let text = match order.delivered_at {
                    Some(delivered_at) => format!(
                        "Tu pedido {} fue entregado el {}.",
                        order.number,
                        delivered_at.format("%d/%m/%Y")
                    ),
                    None => format!(
                        "Tu pedido {} está {}. Te avisaremos cuando cambie de estado.",
                        order.number,
                        order.status.display_es()
                    ),
                };
                Ok(ChatResponse::order_status(text, status_payload(&order)))
            }
            None => Ok(no_orders_found()),
        }
    }
}

fn no_orders_found() -> ChatResponse {
    ChatResponse::text("No encontré pedidos recientes en tu cuenta. ¿El número de pedido es correcto?")
        .with_suggestions(vec![
            "Ver todos mis pedidos".to_string(),
            "Hablar con un agente".to_string(),
        ])
}

/// How-to-buy walkthrough. Static, no collaborator.
pub struct OrderProcessHandler;

#[async_trait]
impl IntentHandler for OrderProcessHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::text(
            "Comprar en Mercalia es sencillo: agrega los productos a tu carrito, revisa tu pedido, elige método de pago (tarjeta, transferencia o pago contra entrega) y confirma. Recibirás un correo con el número de pedido.",
        )
        .with_suggestions(vec![
            "Buscar productos".to_string(),
            "Ir a mi carrito".to_string(),
        ]))
    }
}
