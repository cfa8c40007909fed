use anyhow::Result;
use async_trait::async_trait;

use mercabot_core::{ActionLink, ChatResponse};

use crate::registry::{HandlerContext, IntentHandler};

struct RouteDescriptor {
    key: &'static str,
    url: &'static str,
    description: &'static str,
    button_text: &'static str,
    requires_auth: bool,
}

/// Canonical destination keys match what the entity extractors produce.
const ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor {
        key: "cart",
        url: "/cart",
        description: "tu carrito de compras",
        button_text: "Ir al carrito",
        requires_auth: false,
    },
    RouteDescriptor {
        key: "orders",
        url: "/account/orders",
        description: "tus pedidos",
        button_text: "Ver mis pedidos",
        requires_auth: true,
    },
    RouteDescriptor {
        key: "account",
        url: "/account",
        description: "tu cuenta",
        button_text: "Ir a mi cuenta",
        requires_auth: true,
    },
    RouteDescriptor {
        key: "offers",
        url: "/offers",
        description: "las ofertas",
        button_text: "Ver ofertas",
        requires_auth: false,
    },
    RouteDescriptor {
        key: "home",
        url: "/",
        description: "la página principal",
        button_text: "Ir al inicio",
        requires_auth: false,
    },
    RouteDescriptor {
        key: "contact",
        url: "/contact",
        description: "la página de contacto",
        button_text: "Contacto",
        requires_auth: false,
    },
    RouteDescriptor {
        key: "catalog",
        url: "/catalog",
        description: "el catálogo completo",
        button_text: "Ver catálogo",
        requires_auth: false,
    },
    RouteDescriptor {
        key: "help",
        url: "/help",
        description: "el centro de ayuda",
        button_text: "Centro de ayuda",
        requires_auth: false,
    },
];

pub struct NavigationHandler;

impl NavigationHandler {
    fn login_gate(route: &RouteDescriptor) -> ChatResponse {
        ChatResponse::actions(
            format!("Para ver {} necesitas iniciar sesión primero.", route.description),
            vec![
                ActionLink::navigate("Iniciar sesión", "/login"),
                ActionLink::navigate("Crear cuenta", "/register"),
            ],
        )
    }
}

#[async_trait]
impl IntentHandler for NavigationHandler {
    async fn execute(&self, ctx: HandlerContext<'_>) -> Result<ChatResponse> {
        let Some(destination) = ctx.entities.destination.as_deref() else {
            return Ok(unknown_destination());
        };

        let Some(route) = ROUTES.iter().find(|route| route.key == destination) else {
            tracing::debug!(
                event_name = "navigation.unknown_destination",
                destination,
                "destination has no route descriptor"
            );
            return Ok(unknown_destination());
        };

        if route.requires_auth && ctx.user_id.is_none() {
            return Ok(Self::login_gate(route));
        }

        Ok(ChatResponse::actions(
            format!("Te llevo a {}:", route.description),
            vec![ActionLink::navigate(route.button_text, route.url)],
        ))
    }
}

fn unknown_destination() -> ChatResponse {
    ChatResponse::options(
        "¿A qué parte de la tienda quieres ir?",
        ROUTES.iter().map(|route| route.button_text.to_string()).collect(),
    )
}
