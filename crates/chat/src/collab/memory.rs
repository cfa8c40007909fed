//! In-memory collaborator implementations. They back the demo cli and every
//! test double; a production deployment replaces them with real backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use mercabot_core::text::{contains_word, normalize};
use mercabot_core::{ProductSummary, SearchFilters};

use super::{
    CatalogSearch, Notifier, Order, OrderService, SearchPage, TurnNotification,
};

/// One catalog entry plus the matching metadata the in-memory search uses.
#[derive(Clone, Debug)]
pub struct CatalogRecord {
    pub product: ProductSummary,
    /// Normalized singular-form words this product answers to.
    pub keywords: Vec<String>,
    pub category_tag: String,
    pub color: Option<String>,
}

impl CatalogRecord {
    pub fn new(
        id: &str,
        sku: &str,
        name: &str,
        price_cents: i64,
        brand: Option<&str>,
        keywords: &[&str],
        category_tag: &str,
        color: Option<&str>,
    ) -> Self {
        Self {
            product: ProductSummary {
                id: id.to_string(),
                sku: sku.to_string(),
                name: name.to_string(),
                price_cents,
                brand: brand.map(str::to_string),
                image_url: format!("/images/{id}.jpg"),
                navigation_target: format!("/products/{id}"),
            },
            keywords: keywords.iter().map(|k| normalize(k)).collect(),
            category_tag: category_tag.to_string(),
            color: color.map(|c| normalize(c)),
        }
    }

    fn matches(&self, filters: &SearchFilters) -> bool {
        if let Some(term) = &filters.search_term {
            let term = normalize(term);
            let name = normalize(&self.product.name);
            let hit = term
                .split_whitespace()
                .any(|word| self.keywords.iter().any(|k| k == word) || contains_word(&name, word));
            if !hit {
                return false;
            }
        }
        if let Some(brand) = &filters.brand {
            match &self.product.brand {
                Some(own) if normalize(own) == normalize(brand) => {}
                _ => return false,
            }
        }
        if let Some(color) = &filters.color {
            match &self.color {
                Some(own) if own == &normalize(color) => {}
                _ => return false,
            }
        }
        let price = self.product.price_cents as f64 / 100.0;
        if let Some(min) = filters.min_price {
            if price < min {
                return false;
            }
        }
        if let Some(max) = filters.max_price {
            if price > max {
                return false;
            }
        }
        true
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    records: Vec<CatalogRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }

    /// A small school-and-office assortment for the demo cli and tests.
    pub fn demo() -> Self {
        Self::new(vec![
            CatalogRecord::new(
                "p-001",
                "MOCH-AZ-20",
                "Mochila escolar Nortika 20L",
                45900,
                Some("Nortika"),
                &["mochila", "morral", "backpack"],
                "mochilas-escolares",
                Some("azul"),
            ),
            CatalogRecord::new(
                "p-002",
                "MOCH-RJ-25",
                "Mochila urbana Vanta 25L",
                62900,
                Some("Vanta"),
                &["mochila", "morral", "backpack"],
                "mochilas-escolares",
                Some("rojo"),
            ),
            CatalogRecord::new(
                "p-003",
                "CUAD-100-RY",
                "Cuaderno profesional raya 100 hojas",
                3900,
                Some("Scribe"),
                &["cuaderno", "libreta", "notebook"],
                "cuadernos",
                None,
            ),
            CatalogRecord::new(
                "p-004",
                "LAP-HB-12",
                "Lápiz grafito HB caja 12 piezas",
                5900,
                Some("Mirado"),
                &["lapiz", "pencil"],
                "escritura",
                None,
            ),
            CatalogRecord::new(
                "p-005",
                "CALC-CF-991",
                "Calculadora científica CF-991",
                28900,
                Some("Caltek"),
                &["calculadora", "calculator"],
                "calculadoras",
                None,
            ),
        ])
    }
}

#[async_trait]
impl CatalogSearch for InMemoryCatalog {
    async fn search(&self, filters: &SearchFilters, limit: usize) -> Result<SearchPage> {
        let matches: Vec<ProductSummary> = self
            .records
            .iter()
            .filter(|record| record.matches(filters))
            .map(|record| record.product.clone())
            .collect();
        let total = matches.len();
        Ok(SearchPage { items: matches.into_iter().take(limit).collect(), total })
    }

    async fn search_by_category_tag(
        &self,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<ProductSummary>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.category_tag == tag)
            .map(|record| record.product.clone())
            .take(limit)
            .collect())
    }

    async fn find_by_id(&self, product_id: &str) -> Result<Option<ProductSummary>> {
        Ok(self
            .records
            .iter()
            .find(|record| record.product.id == product_id || record.product.sku == product_id)
            .map(|record| record.product.clone()))
    }
}

/// Orders keyed by user id, with a call counter so tests can prove the
/// login gate never reaches the backend.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: Vec<(String, Order)>,
    calls: AtomicUsize,
}

impl InMemoryOrders {
    pub fn new(orders: Vec<(String, Order)>) -> Self {
        Self { orders, calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderService for InMemoryOrders {
    async fn find_order(&self, id_or_number: &str) -> Result<Option<Order>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .orders
            .iter()
            .find(|(_, order)| order.id == id_or_number || order.number == id_or_number)
            .map(|(_, order)| order.clone()))
    }

    async fn find_orders_by_user(&self, user_id: &str) -> Result<Vec<Order>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .orders
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, order)| order.clone())
            .collect())
    }
}

/// Captures every notification for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<TurnNotification>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<TurnNotification> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: TurnNotification) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}
