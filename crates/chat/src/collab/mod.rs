//! Outbound collaborator seams. The chat crate never talks to a catalog,
//! order system, or notification channel directly; it goes through these
//! traits so every deployment can plug its own backends in and every test
//! can record what was called.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercabot_core::{Intent, ProductSummary, SearchFilters};

mod memory;

pub use memory::{CatalogRecord, InMemoryCatalog, InMemoryOrders, RecordingNotifier};

/// One page of catalog results plus the total match count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
    pub items: Vec<ProductSummary>,
    pub total: usize,
}

#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, filters: &SearchFilters, limit: usize) -> Result<SearchPage>;

    /// Secondary lookup used by the category fallback stage.
    async fn search_by_category_tag(&self, tag: &str, limit: usize)
        -> Result<Vec<ProductSummary>>;

    async fn find_by_id(&self, product_id: &str) -> Result<Option<ProductSummary>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderState {
    pub fn display_es(&self) -> &'static str {
        match self {
            Self::Pending => "pendiente de pago",
            Self::Paid => "pagado",
            Self::Shipped => "en camino",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub id: String,
    pub number: String,
    pub status: OrderState,
    pub item_count: u32,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Accepts either the internal id or the customer-facing order number.
    async fn find_order(&self, id_or_number: &str) -> Result<Option<Order>>;

    async fn find_orders_by_user(&self, user_id: &str) -> Result<Vec<Order>>;
}

/// Free-text generation for conversational filler (search invitations and
/// the like). Deliberately narrower than the reasoning client.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryMatch {
    pub name: String,
    pub score: f64,
}

/// Semantic "which category does this term belong to" lookup, used as the
/// last search stage before giving up.
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn classify(&self, term: &str) -> Result<Option<CategoryMatch>>;
}

/// Payload for the post-turn notification hook.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnNotification {
    pub session_id: String,
    pub intent: Intent,
    pub used_brain: bool,
    pub user_id: Option<String>,
}

/// Fire-and-forget analytics or webhook sink. Invoked on a detached task;
/// a failing notifier must never affect the reply.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: TurnNotification) -> Result<()>;
}
