//! Text normalization shared by indexing, querying and scoring.
//!
//! [`normalize`] is the single tokenizer for the whole crate: the retrieval
//! index builds its vocabulary with it and queries are tokenized with it, so
//! both sides always agree on terms.

/// Tokens dropped by [`normalize`].
///
/// Kept deliberately small: size letters such as `s`, `m` and `l` are real
/// option values and must survive normalization.
pub const STOP_TOKENS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "i", "in", "is", "it", "me",
    "my", "of", "on", "or", "that", "the", "this", "to", "with",
];

/// Phrase-level aliases applied by [`canonical_phrase`].
///
/// Left side is a normalized phrase, right side its canonical spelling.
const PHRASE_ALIASES: &[(&str, &str)] = &[
    ("xxs", "extra extra small"),
    ("2xs", "extra extra small"),
    ("xs", "extra small"),
    ("x small", "extra small"),
    ("s", "small"),
    ("sm", "small"),
    ("m", "medium"),
    ("med", "medium"),
    ("l", "large"),
    ("lg", "large"),
    ("xl", "extra large"),
    ("x large", "extra large"),
    ("xxl", "extra extra large"),
    ("2xl", "extra extra large"),
    ("xx large", "extra extra large"),
    ("xxxl", "extra extra extra large"),
    ("3xl", "extra extra extra large"),
];

/// Token-level spelling variants applied by [`canonical_phrase`].
const TOKEN_ALIASES: &[(&str, &str)] = &[
    ("colour", "color"),
    ("grey", "gray"),
    ("inches", "inch"),
    ("ounces", "ounce"),
    ("oz", "ounce"),
    ("lbs", "pound"),
    ("lb", "pound"),
];

/// Returns `true` if `token` is in [`STOP_TOKENS`].
pub fn is_stop_token(token: &str) -> bool {
    STOP_TOKENS.contains(&token)
}

/// Normalize free text into an ordered sequence of tokens.
///
/// Lowercases (Unicode, locale-independent), treats every non-alphanumeric
/// character as a separator, collapses whitespace and drops [`STOP_TOKENS`].
/// Token order is preserved.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .filter(|t| !is_stop_token(t))
        .map(str::to_string)
        .collect()
}

/// Join tokens produced by [`normalize`] back into a single string.
pub fn normalize_to_text(tokens: &[String]) -> String {
    tokens.join(" ")
}

/// Shorthand for `normalize_to_text(&normalize(text))`.
pub fn normalized_text(text: &str) -> String {
    normalize_to_text(&normalize(text))
}

/// Case-insensitive name equality with Unicode lowercasing.
///
/// Surrounding whitespace is ignored; inner spelling must match.
pub fn same_name(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Normalize a short phrase and rewrite it to its canonical spelling.
///
/// Used only for fuzzy comparison of option values and attribute phrases,
/// never for indexing. Stop tokens are kept so that a phrase made only of
/// stop tokens still has something to compare.
pub fn canonical_phrase(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some((_, canonical)) = PHRASE_ALIASES.iter().find(|(alias, _)| *alias == joined) {
        return (*canonical).to_string();
    }

    joined
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| {
            TOKEN_ALIASES
                .iter()
                .find(|(alias, _)| *alias == t)
                .map(|(_, canonical)| *canonical)
                .unwrap_or(t)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(
            normalize("The Red  T-Shirt, for MEN!"),
            vec!["red", "t", "shirt", "men"]
        );
    }

    #[test]
    fn test_normalize_empty_and_stop_only() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t\n").is_empty());
        assert!(normalize("the and of a").is_empty());
    }

    #[test]
    fn test_normalize_keeps_size_letters() {
        assert_eq!(normalize("size M"), vec!["size", "m"]);
        assert_eq!(normalize("S / L"), vec!["s", "l"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Noise-Cancelling Headphones (Black) - $79.99",
            "  ÉCRU linen Shirt; size XL ",
            "İstanbul Coffee, 12 oz.",
            "100% cotton | the best",
            "",
        ];
        for s in inputs {
            let once = normalize(s);
            let twice = normalize(&normalize_to_text(&once));
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_unicode_lowercase() {
        assert_eq!(normalize("ÉCRU"), vec!["écru"]);
    }

    #[test]
    fn test_same_name_folds_unicode_case() {
        assert!(same_name("Écru", "écru"));
        assert!(same_name(" GRÖSSE ", "grösse"));
        assert!(same_name("Size", "size"));
        assert!(!same_name("size", "sizes"));
    }

    #[test]
    fn test_canonical_phrase_sizes() {
        assert_eq!(canonical_phrase("M"), "medium");
        assert_eq!(canonical_phrase("Medium"), "medium");
        assert_eq!(canonical_phrase("X-Large"), "extra large");
        assert_eq!(canonical_phrase("XL"), "extra large");
    }

    #[test]
    fn test_canonical_phrase_tokens() {
        assert_eq!(canonical_phrase("Colour: Grey"), "color gray");
        assert_eq!(canonical_phrase("12 oz"), "12 ounce");
    }
}
