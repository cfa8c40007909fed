use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only shape handlers are allowed to return. This is the contract with
/// the transport layer; every failure path still produces a valid envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ResponseContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_actions: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Text,
    Products,
    OrderStatus,
    Options,
    Actions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseContent {
    Products(Vec<ProductSummary>),
    OrderStatus(OrderStatusPayload),
    Actions(Vec<ActionLink>),
    Options(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub image_url: String,
    pub navigation_target: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Message,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionLink {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub kind: ActionKind,
}

impl ActionLink {
    pub fn navigate(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), url: Some(url.into()), kind: ActionKind::Navigate }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self { text: text.into(), url: None, kind: ActionKind::Message }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusPayload {
    pub order_id: String,
    pub status: String,
    pub item_count: u32,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: ResponseKind::Text, content: None, suggested_actions: None }
    }

    pub fn options(text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            text: text.into(),
            kind: ResponseKind::Options,
            content: Some(ResponseContent::Options(options)),
            suggested_actions: None,
        }
    }

    pub fn products(text: impl Into<String>, items: Vec<ProductSummary>) -> Self {
        Self {
            text: text.into(),
            kind: ResponseKind::Products,
            content: Some(ResponseContent::Products(items)),
            suggested_actions: None,
        }
    }

    pub fn actions(text: impl Into<String>, actions: Vec<ActionLink>) -> Self {
        Self {
            text: text.into(),
            kind: ResponseKind::Actions,
            content: Some(ResponseContent::Actions(actions)),
            suggested_actions: None,
        }
    }

    pub fn order_status(text: impl Into<String>, payload: OrderStatusPayload) -> Self {
        Self {
            text: text.into(),
            kind: ResponseKind::OrderStatus,
            content: Some(ResponseContent::OrderStatus(payload)),
            suggested_actions: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggested_actions = Some(suggestions);
        self
    }

    /// The generic degradation envelope for internal faults. Still a valid
    /// response; the turn boundary never throws past itself.
    pub fn apology() -> Self {
        Self::text("Lo siento, algo salió mal al procesar tu mensaje. Intenta de nuevo en un momento.")
            .with_suggestions(vec![
                "Intentar de nuevo".to_string(),
                "Hablar con un agente".to_string(),
            ])
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionKind, ActionLink, ChatResponse, ResponseContent, ResponseKind};

    #[test]
    fn kind_serializes_under_type_key() {
        let response = ChatResponse::options("elige".to_string(), vec!["a".to_string()]);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["type"], "options");
        assert_eq!(json["content"][0], "a");
    }

    #[test]
    fn navigate_action_carries_url() {
        let action = ActionLink::navigate("Iniciar sesión", "/login");
        assert_eq!(action.kind, ActionKind::Navigate);
        assert_eq!(action.url.as_deref(), Some("/login"));
    }

    #[test]
    fn apology_is_a_complete_envelope() {
        let apology = ChatResponse::apology();
        assert_eq!(apology.kind, ResponseKind::Text);
        assert!(apology.suggested_actions.as_ref().map(Vec::len).unwrap_or(0) >= 2);
        assert!(apology.content.is_none());
    }

    #[test]
    fn text_content_is_absent() {
        let response = ChatResponse::text("hola");
        assert!(matches!(response.content, None));
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("content").is_none());
    }

    #[test]
    fn actions_content_round_trips() {
        let response = ChatResponse::actions(
            "entra",
            vec![ActionLink::navigate("Login", "/login"), ActionLink::message("Ayuda")],
        );
        let json = serde_json::to_string(&response).expect("serialize");
        let back: ChatResponse = serde_json::from_str(&json).expect("deserialize");
        match back.content {
            Some(ResponseContent::Actions(actions)) => assert_eq!(actions.len(), 2),
            other => panic!("expected actions content, got {other:?}"),
        }
    }
}
