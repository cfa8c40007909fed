use mercabot_core::text::{contains_phrase, normalize, tokenize};
use mercabot_core::{ClassificationResult, Entities, Intent};

/// Minimum internal score an intent must clear; anything below degrades to
/// `UNCLEAR` at confidence 0 rather than surfacing a weak guess.
const MIN_SCORE: f64 = 0.35;

/// Bonus per additional matched phrase beyond the strongest one.
const EXTRA_MATCH_BONUS: f64 = 0.02;
const MAX_CONFIDENCE: f64 = 0.98;

/// Weighted phrase vocabulary, keyed by wire label. Labels are resolved
/// through the closed enum at classification time, so a typo in this table
/// degrades to `UNCLEAR` instead of leaking a garbage intent.
const INTENT_VOCABULARY: &[(&str, &[(&str, f64)])] = &[
    (
        "GREETING",
        &[
            ("hola", 0.95),
            ("buenos dias", 0.93),
            ("buenas tardes", 0.93),
            ("buenas noches", 0.93),
            ("buenas", 0.70),
            ("que tal", 0.80),
            ("saludos", 0.80),
            ("hello", 0.90),
            ("hi", 0.85),
            ("hey", 0.70),
        ],
    ),
    (
        "GRATITUDE",
        &[
            ("gracias", 0.95),
            ("muchas gracias", 0.96),
            ("mil gracias", 0.95),
            ("te agradezco", 0.90),
            ("muy amable", 0.85),
            ("thanks", 0.90),
            ("thank you", 0.92),
        ],
    ),
    (
        "GENERAL_HELP",
        &[
            ("que puedes hacer", 0.93),
            ("en que me puedes ayudar", 0.93),
            ("en que puedes ayudarme", 0.93),
            ("como funciona", 0.75),
            ("ayuda", 0.80),
            ("ayudarme", 0.78),
            ("help", 0.80),
            ("que haces", 0.72),
        ],
    ),
    (
        "HUMAN_ESCALATION",
        &[
            ("hablar con un agente", 0.95),
            ("hablar con alguien", 0.90),
            ("persona real", 0.90),
            ("agente", 0.82),
            ("asesor", 0.85),
            ("representante", 0.85),
            ("humano", 0.82),
            ("atencion a clientes", 0.80),
        ],
    ),
    (
        "ORDER_STATUS",
        &[
            ("estado de mi pedido", 0.95),
            ("estado de mi orden", 0.95),
            ("como va mi pedido", 0.92),
            ("mi pedido", 0.78),
            ("mi orden", 0.76),
            ("order status", 0.92),
        ],
    ),
    (
        "ORDER_TRACKING",
        &[
            ("donde esta mi pedido", 0.95),
            ("donde viene mi paquete", 0.93),
            ("rastrear", 0.90),
            ("rastreo", 0.90),
            ("seguimiento", 0.90),
            ("guia de envio", 0.88),
            ("mi paquete", 0.78),
            ("tracking", 0.90),
        ],
    ),
    (
        "ORDER_PROCESS",
        &[
            ("como hago un pedido", 0.95),
            ("como comprar", 0.90),
            ("como pedir", 0.86),
            ("como ordenar", 0.86),
            ("proceso de compra", 0.92),
            ("how do i order", 0.90),
        ],
    ),
    (
        "RETURNS",
        &[
            ("quiero devolver", 0.95),
            ("devolver", 0.88),
            ("devolucion de mi pedido", 0.92),
            ("regresar un producto", 0.88),
            ("me llego mal", 0.80),
            ("producto defectuoso", 0.85),
            ("return my", 0.85),
        ],
    ),
    (
        "RETURN_POLICY",
        &[
            ("politica de devolucion", 0.95),
            ("politica de devoluciones", 0.95),
            ("cuantos dias tengo para devolver", 0.95),
            ("puedo devolver", 0.85),
            ("condiciones de devolucion", 0.92),
            ("return policy", 0.95),
        ],
    ),
    (
        "PRICING_INFO",
        &[
            ("cuanto cuesta", 0.90),
            ("cuanto vale", 0.90),
            ("formas de pago", 0.92),
            ("metodos de pago", 0.92),
            ("meses sin intereses", 0.88),
            ("precio", 0.78),
            ("precios", 0.78),
            ("costo", 0.76),
            ("how much", 0.85),
        ],
    ),
    (
        "VIEW_OFFERS",
        &[
            ("ofertas", 0.90),
            ("oferta", 0.85),
            ("descuentos", 0.90),
            ("descuento", 0.85),
            ("promociones", 0.90),
            ("promocion", 0.85),
            ("rebajas", 0.86),
            ("cupones", 0.86),
            ("deals", 0.85),
        ],
    ),
    (
        "NAVIGATION_HELP",
        &[
            ("donde encuentro", 0.86),
            ("como llego a", 0.86),
            ("donde esta la seccion", 0.90),
            ("llevame a", 0.90),
            ("ir al carrito", 0.92),
            ("ir a mi cuenta", 0.92),
            ("donde veo", 0.80),
            ("navegar", 0.78),
        ],
    ),
    (
        "PRODUCT_SEARCH",
        &[
            ("estoy buscando", 0.88),
            ("quiero comprar", 0.88),
            ("busco", 0.85),
            ("buscar", 0.80),
            ("muestrame", 0.80),
            ("me interesa", 0.75),
            ("quiero ver", 0.75),
            ("ver productos", 0.80),
            ("necesito", 0.70),
            ("comprar", 0.70),
        ],
    ),
    (
        "OUT_OF_SCOPE",
        &[
            ("chiste", 0.88),
            ("clima", 0.86),
            ("futbol", 0.86),
            ("receta", 0.82),
            ("noticias", 0.82),
            ("horoscopo", 0.86),
            ("cuanto es dos mas dos", 0.85),
        ],
    ),
];

/// Closed product-keyword set for the named-entity pass, singular forms.
const PRODUCT_KEYWORDS: &[&str] = &[
    "mochila", "cuaderno", "libreta", "lapiz", "boligrafo", "pluma", "marcador", "plumon",
    "carpeta", "folder", "calculadora", "agenda", "papel", "tijeras", "pegamento", "resistol",
    "regla", "borrador", "goma", "escritorio", "silla", "laptop", "computadora", "monitor",
    "audifonos", "mouse", "teclado", "usb", "impresora", "tinta", "cartucho", "acuarela",
    "pincel", "crayon", "color", "diccionario", "engrapadora", "clip", "backpack", "notebook",
    "pencil", "pen",
];

const CATEGORY_KEYWORDS: &[&str] = &["escolar", "escolares", "oficina", "arte", "tecnologia", "papeleria"];

const COLOR_KEYWORDS: &[(&str, &str)] = &[
    ("rojo", "rojo"),
    ("roja", "rojo"),
    ("rojos", "rojo"),
    ("rojas", "rojo"),
    ("azul", "azul"),
    ("azules", "azul"),
    ("negro", "negro"),
    ("negra", "negro"),
    ("negros", "negro"),
    ("verde", "verde"),
    ("verdes", "verde"),
    ("amarillo", "amarillo"),
    ("amarilla", "amarillo"),
    ("blanco", "blanco"),
    ("blanca", "blanco"),
    ("gris", "gris"),
    ("rosa", "rosa"),
    ("morado", "morado"),
    ("morada", "morado"),
    ("cafe", "cafe"),
];

const BRAND_KEYWORDS: &[&str] =
    &["faber castell", "bic", "norma", "scribe", "pilot", "casio", "hp", "logitech", "kingston"];

/// Destination table shared with the router's navigation backfill, keys
/// accent-normalized.
const DESTINATION_KEYWORDS: &[(&str, &str)] = &[
    ("carrito", "cart"),
    ("cesta", "cart"),
    ("mis pedidos", "orders"),
    ("pedidos", "orders"),
    ("mi cuenta", "account"),
    ("cuenta", "account"),
    ("perfil", "account"),
    ("ofertas", "offers"),
    ("promociones", "offers"),
    ("inicio", "home"),
    ("pagina principal", "home"),
    ("contacto", "contact"),
    ("catalogo", "catalog"),
    ("ayuda", "help"),
];

pub fn match_destination(normalized_text: &str) -> Option<String> {
    DESTINATION_KEYWORDS
        .iter()
        .find(|(keyword, _)| contains_phrase(normalized_text, keyword))
        .map(|(_, destination)| destination.to_string())
}

/// The fast tier: bounded-latency local scoring, no I/O.
#[derive(Clone, Debug)]
pub struct GuardrailClassifier {
    min_score: f64,
}

impl Default for GuardrailClassifier {
    fn default() -> Self {
        Self { min_score: MIN_SCORE }
    }
}

impl GuardrailClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, utterance: &str) -> ClassificationResult {
        let normalized = normalize(utterance);
        if normalized.is_empty() {
            return ClassificationResult::unclear(utterance);
        }

        let mut best: Option<(&str, f64)> = None;
        for (label, phrases) in INTENT_VOCABULARY {
            let mut strongest = 0.0f64;
            let mut matches = 0usize;
            for (phrase, weight) in *phrases {
                if contains_phrase(&normalized, phrase) {
                    strongest = strongest.max(*weight);
                    matches += 1;
                }
            }
            if matches == 0 {
                continue;
            }

            let score = (strongest + EXTRA_MATCH_BONUS * (matches - 1) as f64).min(MAX_CONFIDENCE);
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((label, score));
            }
        }

        let (intent, confidence) = match best {
            Some((label, score)) if score >= self.min_score => resolve_label(label, score),
            _ => (Intent::Unclear, 0.0),
        };

        let mut entities = extract_entities(&normalized);
        if intent != Intent::NavigationHelp {
            entities.destination = None;
        }

        ClassificationResult::new(intent, confidence, entities, utterance)
    }
}

/// Normalize a vocabulary label into the closed enum. Unknown labels are a
/// programming mistake in the table; they degrade to `UNCLEAR` at confidence
/// 0 so the router never sees an invalid intent.
pub fn resolve_label(label: &str, confidence: f64) -> (Intent, f64) {
    let intent = Intent::from_wire(label);
    if intent == Intent::Unclear && label.trim().to_ascii_uppercase() != "UNCLEAR" {
        tracing::warn!(
            event_name = "guardrail.invalid_label",
            label,
            "vocabulary label is not a recognized intent"
        );
        return (Intent::Unclear, 0.0);
    }
    (intent, confidence)
}

fn extract_entities(normalized: &str) -> Entities {
    let tokens = tokenize(normalized);
    let mut entities = Entities::default();

    for token in &tokens {
        if entities.search_term.is_none() && is_product_keyword(token) {
            entities.search_term = Some(token.clone());
        }
        if entities.color.is_none() {
            if let Some((_, canonical)) =
                COLOR_KEYWORDS.iter().find(|(surface, _)| surface == token)
            {
                entities.color = Some((*canonical).to_string());
            }
        }
        if entities.category.is_none() && CATEGORY_KEYWORDS.contains(&token.as_str()) {
            entities.category = Some(canonical_category(token));
        }
    }

    if entities.brand.is_none() {
        if let Some(brand) =
            BRAND_KEYWORDS.iter().find(|brand| contains_phrase(normalized, brand))
        {
            entities.brand = Some((*brand).to_string());
        }
    }

    extract_price_bounds(&tokens, &mut entities);
    entities.destination = match_destination(normalized);

    entities
}

fn canonical_category(token: &str) -> String {
    if token == "escolares" {
        "escolar".to_string()
    } else {
        token.to_string()
    }
}

fn is_product_keyword(token: &str) -> bool {
    if PRODUCT_KEYWORDS.contains(&token) {
        return true;
    }
    // Plural tolerance: mochilas, lapices, marcadores.
    for candidate in singular_candidates(token) {
        if PRODUCT_KEYWORDS.contains(&candidate.as_str()) {
            return true;
        }
    }
    false
}

fn singular_candidates(token: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(stem) = token.strip_suffix("ces") {
        candidates.push(format!("{stem}z"));
    }
    if let Some(stem) = token.strip_suffix("es") {
        candidates.push(stem.to_string());
    }
    if let Some(stem) = token.strip_suffix('s') {
        candidates.push(stem.to_string());
    }
    candidates
}

fn extract_price_bounds(tokens: &[String], entities: &mut Entities) {
    for (index, token) in tokens.iter().enumerate() {
        let Some(amount) = parse_amount(token) else { continue };

        let window_start = index.saturating_sub(3);
        let context = &tokens[window_start..index];
        let has = |word: &str| context.iter().any(|t| t == word);

        // "entre 200 y 500": the second amount closes the range.
        if has("y") && entities.min_price.is_some() {
            entities.max_price = Some(amount);
        } else if has("entre") || has("desde") || (has("mas") && has("de")) || has("minimo") {
            entities.min_price = Some(amount);
        } else if has("menos") || has("bajo") || has("maximo") || has("hasta") || has("under") {
            entities.max_price = Some(amount);
        }
    }
}

fn parse_amount(token: &str) -> Option<f64> {
    let trimmed = token.trim_start_matches('$');
    if trimmed.is_empty() || !trimmed.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use mercabot_core::Intent;

    use super::{match_destination, resolve_label, GuardrailClassifier};

    fn classifier() -> GuardrailClassifier {
        GuardrailClassifier::new()
    }

    #[test]
    fn greeting_scores_high() {
        let result = classifier().classify("¡Hola!");
        assert_eq!(result.intent, Intent::Greeting);
        assert!(result.confidence > 0.9, "confidence was {}", result.confidence);
    }

    #[test]
    fn gibberish_degrades_to_unclear_at_zero() {
        let result = classifier().classify("qwrty plomk zzz");
        assert_eq!(result.intent, Intent::Unclear);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn empty_input_is_unclear() {
        let result = classifier().classify("   ");
        assert_eq!(result.intent, Intent::Unclear);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn invalid_vocabulary_label_normalizes_to_unclear() {
        let (intent, confidence) = resolve_label("PRODUCT_SERCH", 0.9);
        assert_eq!(intent, Intent::Unclear);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn valid_label_keeps_its_confidence() {
        let (intent, confidence) = resolve_label("GREETING", 0.77);
        assert_eq!(intent, Intent::Greeting);
        assert_eq!(confidence, 0.77);
    }

    #[test]
    fn product_search_extracts_plural_search_term() {
        let result = classifier().classify("busco mochilas rojas");
        assert_eq!(result.intent, Intent::ProductSearch);
        assert_eq!(result.entities.search_term.as_deref(), Some("mochilas"));
        assert_eq!(result.entities.color.as_deref(), Some("rojo"));
    }

    #[test]
    fn price_bounds_are_extracted() {
        let result = classifier().classify("busco una laptop por menos de 8000");
        assert_eq!(result.entities.max_price, Some(8000.0));
        assert!(result.entities.min_price.is_none());

        let result = classifier().classify("quiero comprar audifonos entre 200 y 500 pesos");
        assert_eq!(result.entities.min_price, Some(200.0));
        assert_eq!(result.entities.max_price, Some(500.0));
    }

    #[test]
    fn brand_phrases_are_matched() {
        let result = classifier().classify("busco colores faber castell");
        assert_eq!(result.entities.brand.as_deref(), Some("faber castell"));
    }

    #[test]
    fn navigation_intent_keeps_destination_entity() {
        let result = classifier().classify("llévame a mi carrito");
        assert_eq!(result.intent, Intent::NavigationHelp);
        assert_eq!(result.entities.destination.as_deref(), Some("cart"));
    }

    #[test]
    fn non_navigation_intent_drops_destination() {
        let result = classifier().classify("quiero ver ofertas");
        assert_eq!(result.intent, Intent::ViewOffers);
        assert!(result.entities.destination.is_none());
    }

    #[test]
    fn destination_table_is_accent_normalized() {
        assert_eq!(match_destination("donde esta el catalogo").as_deref(), Some("catalog"));
        assert_eq!(match_destination("ir a mis pedidos").as_deref(), Some("orders"));
        assert!(match_destination("algo sin destino").is_none());
    }

    #[test]
    fn tracking_phrase_beats_generic_order_words() {
        let result = classifier().classify("¿dónde está mi pedido?");
        assert_eq!(result.intent, Intent::OrderTracking);
        assert!(result.confidence > 0.9);
    }

    #[test]
    fn availability_question_without_verbs_is_unclear_here() {
        // The deterministic override in the router handles this shape; the
        // statistical tier alone must not guess.
        let result = classifier().classify("¿tienen mochilas?");
        assert_eq!(result.intent, Intent::Unclear);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.entities.search_term.as_deref(), Some("mochilas"));
    }

    #[test]
    fn common_phrases_classify_sensibly() {
        let cases = [
            ("muchas gracias!", Intent::Gratitude),
            ("¿qué puedes hacer?", Intent::GeneralHelp),
            ("quiero hablar con un agente", Intent::HumanEscalation),
            ("¿cómo hago un pedido?", Intent::OrderProcess),
            ("política de devoluciones", Intent::ReturnPolicy),
            ("quiero devolver mi compra", Intent::Returns),
            ("¿qué formas de pago aceptan?", Intent::PricingInfo),
            ("cuéntame un chiste", Intent::OutOfScope),
        ];

        let classifier = classifier();
        for (text, expected) in cases {
            let result = classifier.classify(text);
            assert_eq!(result.intent, expected, "for {text:?}");
            assert!(result.confidence >= 0.6, "low confidence for {text:?}");
        }
    }
}
