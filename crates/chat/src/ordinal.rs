//! Resolution of ordinal references like "el primero" or "quiero ver la
//! segunda" against the most recent result listing.

use mercabot_core::text::normalize;

const ORDINAL_WORDS: &[(&str, usize)] = &[
    ("primero", 0),
    ("primera", 0),
    ("primer", 0),
    ("segundo", 1),
    ("segunda", 1),
    ("tercero", 2),
    ("tercera", 2),
    ("tercer", 2),
    ("cuarto", 3),
    ("cuarta", 3),
    ("quinto", 4),
    ("quinta", 4),
    ("first", 0),
    ("second", 1),
    ("third", 2),
    ("fourth", 3),
    ("fifth", 4),
];

/// Zero-based index the utterance refers to, if it reads like an ordinal
/// reference. A bare digit ("2") counts; digits buried in longer text do not.
pub fn resolve(utterance: &str) -> Option<usize> {
    let normalized = normalize(utterance);
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 6 {
        return None;
    }

    if let [single] = tokens.as_slice() {
        if let Ok(number) = single.parse::<usize>() {
            return number.checked_sub(1);
        }
    }

    tokens.iter().find_map(|token| {
        ORDINAL_WORDS
            .iter()
            .find(|(word, _)| word == token)
            .map(|(_, index)| *index)
    })
}

#[cfg(test)]
mod tests {
    use super::resolve;

    #[test]
    fn spanish_ordinals_resolve_zero_based() {
        let cases = [
            ("el primero", Some(0)),
            ("la segunda", Some(1)),
            ("quiero ver el tercero", Some(2)),
            ("El Primero", Some(0)),
            ("muéstrame la primera", Some(0)),
        ];
        for (utterance, expected) in cases {
            assert_eq!(resolve(utterance), expected, "utterance {utterance:?}");
        }
    }

    #[test]
    fn english_and_numeric_forms_resolve() {
        assert_eq!(resolve("the first one"), Some(0));
        assert_eq!(resolve("2"), Some(1));
        assert_eq!(resolve("0"), None);
    }

    #[test]
    fn ordinary_sentences_do_not_resolve() {
        assert_eq!(resolve("quiero una mochila"), None);
        assert_eq!(resolve("tengo 2 pedidos pendientes y quiero saber donde estan"), None);
        assert_eq!(resolve(""), None);
    }
}
