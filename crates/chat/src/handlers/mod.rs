//! Intent handler implementations and the default registry wiring.

use std::sync::Arc;

use mercabot_core::Intent;

use crate::collab::{CatalogSearch, CategoryClassifier, OrderService, TextGenerator};
use crate::registry::{HandlerRegistry, IntentHandler};
use crate::search::SearchPipeline;

mod navigation;
mod offers;
mod orders;
mod product_search;
mod returns;
mod smalltalk;

pub use navigation::NavigationHandler;
pub use offers::{PricingInfoHandler, ViewOffersHandler};
pub use orders::{OrderProcessHandler, OrderStatusHandler, OrderTrackingHandler};
pub use product_search::ProductSearchHandler;
pub use returns::{ReturnPolicyHandler, ReturnsHandler};
pub use smalltalk::{
    GeneralHelpHandler, GratitudeHandler, GreetingHandler, HumanEscalationHandler,
    OutOfScopeHandler, UnclearHandler,
};

/// Collaborator handles the default registry wires into its handlers. The
/// generator and classifier are optional capabilities; handlers degrade to
/// static behavior without them.
pub struct HandlerDeps {
    pub catalog: Arc<dyn CatalogSearch>,
    pub orders: Arc<dyn OrderService>,
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub classifier: Option<Arc<dyn CategoryClassifier>>,
    pub category_similarity: f64,
}

/// One handler per intent variant. The `match` is exhaustive over
/// [`Intent::ALL`] so adding a variant without a handler fails to compile.
pub fn default_registry(deps: HandlerDeps) -> HandlerRegistry {
    let fallback: Arc<dyn IntentHandler> = Arc::new(UnclearHandler);
    let mut registry = HandlerRegistry::new(fallback.clone());

    for intent in Intent::ALL {
        let handler: Arc<dyn IntentHandler> = match intent {
            Intent::ProductSearch => Arc::new(ProductSearchHandler::new(
                SearchPipeline::new(
                    deps.catalog.clone(),
                    deps.classifier.clone(),
                    deps.category_similarity,
                ),
                deps.generator.clone(),
            )),
            Intent::OrderStatus => Arc::new(OrderStatusHandler::new(deps.orders.clone())),
            Intent::OrderTracking => Arc::new(OrderTrackingHandler::new(deps.orders.clone())),
            Intent::OrderProcess => Arc::new(OrderProcessHandler),
            Intent::Returns => Arc::new(ReturnsHandler::new(deps.orders.clone())),
            Intent::ReturnPolicy => Arc::new(ReturnPolicyHandler),
            Intent::NavigationHelp => Arc::new(NavigationHandler),
            Intent::ViewOffers => Arc::new(ViewOffersHandler),
            Intent::PricingInfo => Arc::new(PricingInfoHandler),
            Intent::Greeting => Arc::new(GreetingHandler),
            Intent::Gratitude => Arc::new(GratitudeHandler),
            Intent::GeneralHelp => Arc::new(GeneralHelpHandler),
            Intent::OutOfScope => Arc::new(OutOfScopeHandler),
            Intent::HumanEscalation => Arc::new(HumanEscalationHandler),
            Intent::Unclear => fallback.clone(),
        };
        registry.register(intent, handler);
    }

    registry
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mercabot_core::Intent;

    use super::{default_registry, HandlerDeps};
    use crate::collab::{InMemoryCatalog, InMemoryOrders};

    #[test]
    fn every_intent_variant_has_a_handler() {
        let registry = default_registry(HandlerDeps {
            catalog: Arc::new(InMemoryCatalog::demo()),
            orders: Arc::new(InMemoryOrders::default()),
            generator: None,
            classifier: None,
            category_similarity: 0.3,
        });
        assert_eq!(registry.len(), Intent::ALL.len());
    }
}
