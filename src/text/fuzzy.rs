//! Fuzzy string matching for option values and attribute phrases.
//!
//! Similarity is a token-sort edit ratio over canonicalized phrases:
//!
//!   sim(a, b) = 1 - lev(sort(a'), sort(b')) / max(|a'|, |b'|)
//!
//! where `a'` is [`canonical_phrase`] of `a`. Sorting the tokens makes the
//! score insensitive to word order; the edit ratio absorbs small typos.
//!
//! Numbers are never typos: two phrases whose digit runs differ (`pack of 2`
//! vs `pack of 3`, `12 oz` vs `16 oz`) are a miss whatever their similarity.

use super::normalize::{canonical_phrase, normalized_text};

/// Similarity a pair must strictly exceed to count as a fuzzy match.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// How two phrases compare under the exact-then-fuzzy policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhraseMatch {
    /// Equal as written, or equal after normalization.
    Exact,
    /// Not equal, but similarity exceeded the threshold.
    Fuzzy(f64),
    /// Best similarity stayed at or below the threshold, or the quantities
    /// differ. Never above the threshold it was compared with.
    Miss(f64),
}

impl PhraseMatch {
    pub fn is_match(&self) -> bool {
        !matches!(self, PhraseMatch::Miss(_))
    }

    /// Similarity backing this verdict (1.0 for exact).
    pub fn similarity(&self) -> f64 {
        match self {
            PhraseMatch::Exact => 1.0,
            PhraseMatch::Fuzzy(s) | PhraseMatch::Miss(s) => *s,
        }
    }
}

/// Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn sorted_tokens(phrase: &str) -> String {
    let mut tokens: Vec<&str> = phrase.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Digit runs of the canonical phrase, sorted.
fn quantities(phrase: &str) -> Vec<String> {
    let canonical = canonical_phrase(phrase);
    let mut numbers: Vec<String> = canonical
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.trim_start_matches('0'))
        .map(|run| if run.is_empty() { "0" } else { run }.to_string())
        .collect();
    numbers.sort_unstable();
    numbers
}

/// Similarity between two short strings, in `[0, 1]`.
///
/// Symmetric and reflexive. Two strings that are both empty after
/// canonicalization are identical (1.0); one empty side scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = sorted_tokens(&canonical_phrase(a));
    let b = sorted_tokens(&canonical_phrase(b));

    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let dist = levenshtein(&a, &b);
    (1.0 - dist as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Compare `candidate` against `target` under the exact-then-fuzzy policy.
///
/// Exact equality short-circuits: an exact match is never downgraded by the
/// similarity heuristic.
pub fn compare(candidate: &str, target: &str, threshold: f64) -> PhraseMatch {
    if candidate == target {
        return PhraseMatch::Exact;
    }
    let normalized = normalized_text(candidate);
    if !normalized.is_empty() && normalized == normalized_text(target) {
        return PhraseMatch::Exact;
    }

    let sim = similarity(candidate, target);
    if quantities(candidate) != quantities(target) {
        return PhraseMatch::Miss(sim.min(threshold));
    }
    if sim > threshold {
        PhraseMatch::Fuzzy(sim)
    } else {
        PhraseMatch::Miss(sim)
    }
}

/// Best verdict for `target` among several candidates.
///
/// An exact hit wins immediately; otherwise the highest similarity is kept.
/// Returns the winning candidate index alongside the verdict, or `None` when
/// `candidates` is empty.
pub fn best_match<'a, I>(candidates: I, target: &str, threshold: f64) -> Option<(usize, PhraseMatch)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, PhraseMatch)> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let verdict = compare(candidate, target, threshold);
        if verdict == PhraseMatch::Exact {
            return Some((idx, verdict));
        }
        let better = match &best {
            None => true,
            Some((_, current)) => verdict.similarity() > current.similarity(),
        };
        if better {
            best = Some((idx, verdict));
        }
    }

    best
}

/// Returns `true` if `a` and `b` match under [`compare`] with the default
/// threshold.
pub fn is_match(a: &str, b: &str) -> bool {
    compare(a, b, FUZZY_MATCH_THRESHOLD).is_match()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: &[(&str, &str)] = &[
        ("red", "Red"),
        ("navy blue", "blue navy"),
        ("colour", "color"),
        ("M", "Medium"),
        ("small", "large"),
        ("", "x"),
        ("", ""),
        ("stainless steel", "stainles steel"),
        ("machine wash", "hand wash"),
    ];

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn test_similarity_reflexive() {
        for (a, b) in PAIRS {
            assert_eq!(similarity(a, a), 1.0);
            assert_eq!(similarity(b, b), 1.0);
        }
    }

    #[test]
    fn test_similarity_symmetric() {
        for (a, b) in PAIRS {
            assert_eq!(similarity(a, b), similarity(b, a), "asymmetric for {a:?} / {b:?}");
        }
    }

    #[test]
    fn test_similarity_bounds() {
        for (a, b) in PAIRS {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_similarity_word_order_and_case() {
        assert_eq!(similarity("Navy Blue", "blue navy"), 1.0);
    }

    #[test]
    fn test_size_abbreviation_matches() {
        assert_eq!(similarity("M", "Medium"), 1.0);
        assert!(is_match("Medium", "M"));
        assert!(!is_match("S", "M"));
    }

    #[test]
    fn test_typo_is_fuzzy_match() {
        let verdict = compare("stainles steel", "stainless steel", FUZZY_MATCH_THRESHOLD);
        assert!(matches!(verdict, PhraseMatch::Fuzzy(_)));
    }

    #[test]
    fn test_exact_short_circuits() {
        assert_eq!(compare("Red", "red", FUZZY_MATCH_THRESHOLD), PhraseMatch::Exact);
        // Even with an impossible threshold, exact equality still matches.
        assert_eq!(compare("red", "red", 2.0), PhraseMatch::Exact);
    }

    #[test]
    fn test_distinct_values_miss() {
        assert!(!is_match("machine wash", "hand wash"));
        assert!(!is_match("small", "large"));
    }

    #[test]
    fn test_different_quantities_miss() {
        for (chosen, wanted) in [
            ("pack of 2", "pack of 3"),
            ("size 10", "size 11"),
            ("12 oz", "16 oz"),
            ("32GB", "64GB"),
            ("size:10", "size:11"),
        ] {
            let verdict = compare(chosen, wanted, FUZZY_MATCH_THRESHOLD);
            assert!(
                matches!(verdict, PhraseMatch::Miss(s) if s <= FUZZY_MATCH_THRESHOLD),
                "{chosen:?} vs {wanted:?} gave {verdict:?}"
            );
        }
    }

    #[test]
    fn test_same_quantities_still_fuzzy() {
        assert!(is_match("12 oz", "12 ounces"));
        assert!(is_match("pack of 02", "pack of 2"));
        assert!(is_match("stainles steel 500ml", "stainless steel 500 ml"));
    }

    #[test]
    fn test_best_match_skips_wrong_quantity() {
        let candidates = ["size:11", "sise:10"];
        let (idx, verdict) =
            best_match(candidates.iter().copied(), "size:10", FUZZY_MATCH_THRESHOLD).unwrap();
        assert_eq!(idx, 1);
        assert!(verdict.is_match());
    }

    #[test]
    fn test_best_match_prefers_exact() {
        let candidates = ["blue", "red", "dark red"];
        let (idx, verdict) =
            best_match(candidates.iter().copied(), "red", FUZZY_MATCH_THRESHOLD).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(verdict, PhraseMatch::Exact);
    }

    #[test]
    fn test_best_match_empty() {
        assert!(best_match(std::iter::empty(), "red", FUZZY_MATCH_THRESHOLD).is_none());
    }
}
