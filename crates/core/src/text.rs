//! Spanish-first text normalization shared by the classifier tiers, the
//! deterministic overrides, and the search fallbacks.

/// Map accented characters to their bare form (á → a, ñ → n, ü → u).
pub fn strip_accents(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Lowercase, strip accents, and replace punctuation with spaces. The output
/// contains only lowercase alphanumerics separated by single spaces.
pub fn normalize(input: &str) -> String {
    let stripped = strip_accents(&input.to_lowercase());
    let mut sanitized = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        if ch.is_alphanumeric() {
            sanitized.push(ch);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokenize(input: &str) -> Vec<String> {
    normalize(input).split_whitespace().map(str::to_string).collect()
}

/// Word-boundary containment over normalized text. `contains` alone would
/// match "hola" inside "holanda".
pub fn contains_word(normalized_text: &str, word: &str) -> bool {
    normalized_text.split_whitespace().any(|token| token == word)
}

/// Phrase match over normalized text; single words require a word boundary,
/// multi-word phrases use substring containment.
pub fn contains_phrase(normalized_text: &str, phrase: &str) -> bool {
    if phrase.contains(' ') {
        normalized_text.contains(phrase)
    } else {
        contains_word(normalized_text, phrase)
    }
}
