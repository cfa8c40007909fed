//! Staged product search. Each stage runs only when the previous one came
//! back empty: exact term, singularized term, semantic category fallback.

use std::sync::Arc;

use anyhow::Result;

use mercabot_core::text::normalize;
use mercabot_core::{ProductSummary, SearchFilters};

use crate::collab::{CatalogSearch, CategoryClassifier};

pub const RESULT_LIMIT: usize = 5;

/// Category name (as the classifier reports it) to catalog tag. The catalog
/// indexes by tag, the classifier speaks display names; this table is the
/// bridge and is maintained by hand.
const CATEGORY_TAGS: &[(&str, &str)] = &[
    ("mochilas", "mochilas-escolares"),
    ("cuadernos", "cuadernos"),
    ("escritura", "escritura"),
    ("calculadoras", "calculadoras"),
    ("arte", "arte-y-manualidades"),
    ("oficina", "oficina"),
];

/// Spanish plural to singular, first applicable rule wins. The order matters:
/// "lapices" must become "lapiz" via the `ces` rule before the generic `es`
/// rule could mangle it into "lapic".
pub fn singularize(word: &str) -> Option<String> {
    if let Some(stem) = word.strip_suffix("ces") {
        if !stem.is_empty() {
            return Some(format!("{stem}z"));
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if stem.len() > 2 {
            return Some(stem.to_string());
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.len() > 2 {
            return Some(stem.to_string());
        }
    }
    None
}

fn singularize_term(term: &str) -> Option<String> {
    let words: Vec<String> = normalize(term)
        .split_whitespace()
        .map(|word| singularize(word).unwrap_or_else(|| word.to_string()))
        .collect();
    let candidate = words.join(" ");
    if candidate == normalize(term) {
        None
    } else {
        Some(candidate)
    }
}

fn tag_for_category(name: &str) -> Option<&'static str> {
    let name = normalize(name);
    CATEGORY_TAGS.iter().find(|(category, _)| *category == name).map(|(_, tag)| *tag)
}

/// Which stage produced the results, surfaced so the handler can phrase the
/// reply accordingly.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Exact(Vec<ProductSummary>),
    Singularized { term: String, items: Vec<ProductSummary> },
    Category { name: String, items: Vec<ProductSummary> },
    Empty,
}

impl SearchOutcome {
    pub fn items(&self) -> &[ProductSummary] {
        match self {
            Self::Exact(items)
            | Self::Singularized { items, .. }
            | Self::Category { items, .. } => items,
            Self::Empty => &[],
        }
    }
}

pub struct SearchPipeline {
    catalog: Arc<dyn CatalogSearch>,
    classifier: Option<Arc<dyn CategoryClassifier>>,
    category_similarity: f64,
}

impl SearchPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        classifier: Option<Arc<dyn CategoryClassifier>>,
        category_similarity: f64,
    ) -> Self {
        Self { catalog, classifier, category_similarity }
    }

    pub async fn run(&self, filters: &SearchFilters) -> Result<SearchOutcome> {
        let page = self.catalog.search(filters, RESULT_LIMIT).await?;
        if !page.items.is_empty() {
            return Ok(SearchOutcome::Exact(page.items));
        }

        if let Some(term) = &filters.search_term {
            if let Some(singular) = singularize_term(term) {
                let mut retry = filters.clone();
                retry.search_term = Some(singular.clone());
                let page = self.catalog.search(&retry, RESULT_LIMIT).await?;
                if !page.items.is_empty() {
                    tracing::debug!(
                        event_name = "search.singularized_hit",
                        original = %term,
                        singular = %singular,
                        "plural term matched after singularization"
                    );
                    return Ok(SearchOutcome::Singularized { term: singular, items: page.items });
                }
            }

            if let Some(classifier) = &self.classifier {
                if let Some(category) = classifier.classify(term).await? {
                    if category.score >= self.category_similarity {
                        if let Some(tag) = tag_for_category(&category.name) {
                            let items =
                                self.catalog.search_by_category_tag(tag, RESULT_LIMIT).await?;
                            if !items.is_empty() {
                                tracing::debug!(
                                    event_name = "search.category_fallback",
                                    term = %term,
                                    category = %category.name,
                                    score = category.score,
                                    "term resolved through category fallback"
                                );
                                return Ok(SearchOutcome::Category {
                                    name: category.name,
                                    items,
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(SearchOutcome::Empty)
    }
}
