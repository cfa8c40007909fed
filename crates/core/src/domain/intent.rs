use serde::{Deserialize, Serialize};

/// Closed vocabulary of business intents.
///
/// Wire names are the SCREAMING_SNAKE form (`PRODUCT_SEARCH`, ...). Parsing an
/// unknown label through [`Intent::from_wire`] never fails; it collapses to
/// [`Intent::Unclear`] so an invalid intent cannot travel past the boundary
/// that received it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    ProductSearch,
    OrderStatus,
    PricingInfo,
    HumanEscalation,
    GeneralHelp,
    Greeting,
    Gratitude,
    OutOfScope,
    Unclear,
    NavigationHelp,
    Returns,
    ReturnPolicy,
    OrderTracking,
    OrderProcess,
    ViewOffers,
}

impl Intent {
    pub const ALL: [Intent; 15] = [
        Intent::ProductSearch,
        Intent::OrderStatus,
        Intent::PricingInfo,
        Intent::HumanEscalation,
        Intent::GeneralHelp,
        Intent::Greeting,
        Intent::Gratitude,
        Intent::OutOfScope,
        Intent::Unclear,
        Intent::NavigationHelp,
        Intent::Returns,
        Intent::ReturnPolicy,
        Intent::OrderTracking,
        Intent::OrderProcess,
        Intent::ViewOffers,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::ProductSearch => "PRODUCT_SEARCH",
            Self::OrderStatus => "ORDER_STATUS",
            Self::PricingInfo => "PRICING_INFO",
            Self::HumanEscalation => "HUMAN_ESCALATION",
            Self::GeneralHelp => "GENERAL_HELP",
            Self::Greeting => "GREETING",
            Self::Gratitude => "GRATITUDE",
            Self::OutOfScope => "OUT_OF_SCOPE",
            Self::Unclear => "UNCLEAR",
            Self::NavigationHelp => "NAVIGATION_HELP",
            Self::Returns => "RETURNS",
            Self::ReturnPolicy => "RETURN_POLICY",
            Self::OrderTracking => "ORDER_TRACKING",
            Self::OrderProcess => "ORDER_PROCESS",
            Self::ViewOffers => "VIEW_OFFERS",
        }
    }

    /// Total parse: unknown labels become `Unclear`, never an error.
    pub fn from_wire(label: &str) -> Intent {
        match label.trim().to_ascii_uppercase().as_str() {
            "PRODUCT_SEARCH" => Self::ProductSearch,
            "ORDER_STATUS" => Self::OrderStatus,
            "PRICING_INFO" => Self::PricingInfo,
            "HUMAN_ESCALATION" => Self::HumanEscalation,
            "GENERAL_HELP" => Self::GeneralHelp,
            "GREETING" => Self::Greeting,
            "GRATITUDE" => Self::Gratitude,
            "OUT_OF_SCOPE" => Self::OutOfScope,
            "UNCLEAR" => Self::Unclear,
            "NAVIGATION_HELP" => Self::NavigationHelp,
            "RETURNS" => Self::Returns,
            "RETURN_POLICY" => Self::ReturnPolicy,
            "ORDER_TRACKING" => Self::OrderTracking,
            "ORDER_PROCESS" => Self::OrderProcess,
            "VIEW_OFFERS" => Self::ViewOffers,
            _ => Self::Unclear,
        }
    }

    /// One-line description embedded in the deep reasoner prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ProductSearch => "the user wants to find or buy a product",
            Self::OrderStatus => "the user asks about the state of an existing order",
            Self::PricingInfo => "the user asks about prices, payment methods, or costs",
            Self::HumanEscalation => "the user wants to talk to a human agent",
            Self::GeneralHelp => "the user asks what the assistant can do",
            Self::Greeting => "the user opens the conversation (hola, buenos dias)",
            Self::Gratitude => "the user thanks the assistant",
            Self::OutOfScope => "the request has nothing to do with the store",
            Self::Unclear => "the request cannot be understood",
            Self::NavigationHelp => "the user asks how to reach a page or section of the site",
            Self::Returns => "the user wants to return a purchased product",
            Self::ReturnPolicy => "the user asks about the return policy",
            Self::OrderTracking => "the user asks where their shipment is",
            Self::OrderProcess => "the user asks how to place an order",
            Self::ViewOffers => "the user asks for discounts or current offers",
        }
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self::Unclear
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn wire_names_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_wire(intent.wire_name()), intent);
        }
    }

    #[test]
    fn from_wire_is_case_and_whitespace_tolerant() {
        assert_eq!(Intent::from_wire("  product_search "), Intent::ProductSearch);
        assert_eq!(Intent::from_wire("greeting"), Intent::Greeting);
    }

    #[test]
    fn unknown_labels_collapse_to_unclear() {
        for label in ["PRODUCT_SERCH", "BUY_STUFF", "", "null", "🤖"] {
            assert_eq!(Intent::from_wire(label), Intent::Unclear);
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Intent::ViewOffers).expect("serialize");
        assert_eq!(json, "\"VIEW_OFFERS\"");
    }
}
