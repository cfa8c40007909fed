use anyhow::Result;
use async_trait::async_trait;

use mercabot_core::{ActionLink, ChatResponse};

use crate::registry::{HandlerContext, IntentHandler};

pub struct ViewOffersHandler;

#[async_trait]
impl IntentHandler for ViewOffersHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::actions(
            "Estas son nuestras promociones activas:",
            vec![
                ActionLink::navigate("Ofertas de la semana", "/offers"),
                ActionLink::navigate("Liquidación regreso a clases", "/offers/back-to-school"),
            ],
        ))
    }
}

pub struct PricingInfoHandler;

#[async_trait]
impl IntentHandler for PricingInfoHandler {
    async fn execute(&self, _ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        Ok(ChatResponse::text(
            "Todos los precios publicados incluyen impuestos. El envío es gratis en compras mayores a $499; por debajo de ese monto cuesta $59. Si buscas el precio de un producto específico, dime cuál.",
        )
        .with_suggestions(vec![
            "Buscar un producto".to_string(),
            "Ver ofertas".to_string(),
        ]))
    }
}
