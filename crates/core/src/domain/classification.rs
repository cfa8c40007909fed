use serde::{Deserialize, Serialize};

use crate::domain::intent::Intent;

/// Structured fragments extracted from an utterance.
///
/// Both inference tiers and the deterministic overrides write into the same
/// shape. The serde aliases accept the camelCase keys the deep reasoner tends
/// to emit; anything outside the known fields lands in `extra` untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
    #[serde(alias = "searchTerm", skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(alias = "minPrice", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(alias = "maxPrice", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.search_term.is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.color.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.destination.is_none()
            && self.extra.is_empty()
    }

    /// Last-write-wins merge; fields absent in `newer` are kept.
    pub fn merge(&mut self, newer: &Entities) {
        if newer.search_term.is_some() {
            self.search_term = newer.search_term.clone();
        }
        if newer.category.is_some() {
            self.category = newer.category.clone();
        }
        if newer.brand.is_some() {
            self.brand = newer.brand.clone();
        }
        if newer.color.is_some() {
            self.color = newer.color.clone();
        }
        if newer.min_price.is_some() {
            self.min_price = newer.min_price;
        }
        if newer.max_price.is_some() {
            self.max_price = newer.max_price;
        }
        if newer.destination.is_some() {
            self.destination = newer.destination.clone();
        }
        for (key, value) in &newer.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// The tier-transparent classification shape.
///
/// The router treats results identically whether the guardrail or the brain
/// produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: Entities,
    pub original_text: String,
}

impl ClassificationResult {
    pub fn new(
        intent: Intent,
        confidence: f64,
        entities: Entities,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            entities,
            original_text: original_text.into(),
        }
    }

    /// The single shape every failure path degrades to.
    pub fn unclear(original_text: impl Into<String>) -> Self {
        Self::new(Intent::Unclear, 0.0, Entities::default(), original_text)
    }
}
