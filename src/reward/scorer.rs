//! Attribute-matching reward for a completed purchase.
//!
//! Given the purchased product, the options chosen for it and the episode's
//! [`Instruction`], the scorer computes
//!
//!   reward = (w_o * F_opt + w_a * F_attr + w_p * P) / (w_o + w_a + w_p)
//!
//! where `F_opt` is the fraction of target option dimensions matched,
//! `F_attr` the fraction of required attribute phrases the product carries,
//! and `P` is 1 when the price is within the ceiling. The price term and its
//! weight are only present when the target sets a ceiling. Every comparison
//! uses the exact-then-fuzzy policy from [`crate::text::fuzzy`].
//!
//! Scoring is a pure function of its inputs; the session calls it exactly once
//! per episode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Instruction, Product, ProductId, Target};
use crate::config::RewardConfig;
use crate::search::SearchIndex;
use crate::text::fuzzy::{best_match, compare, PhraseMatch};
use crate::text::same_name;

/// Default weight of the option-match fraction.
pub const OPTION_WEIGHT: f64 = 0.5;
/// Default weight of the attribute-match fraction.
pub const ATTRIBUTE_WEIGHT: f64 = 0.3;
/// Default weight of the price check (only when a ceiling is set).
pub const PRICE_WEIGHT: f64 = 0.2;
/// Reward at or above which an episode is a success.
pub const SUCCESS_THRESHOLD: f64 = 1.0;
/// Free-text instructions succeed if the purchase is within this many hits.
pub const FALLBACK_TOP_K: usize = 10;

/// Outcome of comparing one target phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Exact (or normalized-exact) equality.
    Matched,
    /// Similarity above the fuzzy threshold. Counts as a full match.
    PartiallyMatched,
    Missed,
}

impl MatchKind {
    pub fn counts(&self) -> bool {
        !matches!(self, MatchKind::Missed)
    }
}

impl From<PhraseMatch> for MatchKind {
    fn from(m: PhraseMatch) -> Self {
        match m {
            PhraseMatch::Exact => MatchKind::Matched,
            PhraseMatch::Fuzzy(_) => MatchKind::PartiallyMatched,
            PhraseMatch::Miss(_) => MatchKind::Missed,
        }
    }
}

/// Verdict for one target option dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionMatch {
    pub dimension: String,
    pub target: String,
    /// The value selected on the item page, if the product has the dimension.
    pub chosen: Option<String>,
    /// Attribute phrase that satisfied the target when the product has no
    /// such option dimension.
    pub via_attribute: Option<String>,
    pub kind: MatchKind,
    pub similarity: f64,
}

/// Verdict for one required attribute phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMatch {
    pub phrase: String,
    /// Closest product attribute phrase, if the product has any.
    pub closest: Option<String>,
    pub kind: MatchKind,
    pub similarity: f64,
}

/// The scored outcome of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub product: ProductId,
    /// Reward in `[0, 1]`.
    pub reward: f64,
    pub success: bool,
    pub options: Vec<OptionMatch>,
    pub attributes: Vec<AttributeMatch>,
    /// Required attribute phrases that matched.
    pub matched_attributes: Vec<String>,
    /// `None` when the instruction set no price ceiling.
    pub price_ok: Option<bool>,
    /// Set when the instruction had no structured target and the reward came
    /// from the relevance check.
    pub fallback: bool,
}

impl ScoreResult {
    /// Fraction of option dimensions that counted as matched (1.0 if none).
    pub fn option_fraction(&self) -> f64 {
        fraction(self.options.iter().map(|o| o.kind))
    }

    /// Fraction of required attributes that counted as matched (1.0 if none).
    pub fn attribute_fraction(&self) -> f64 {
        fraction(self.attributes.iter().map(|a| a.kind))
    }
}

fn fraction(kinds: impl Iterator<Item = MatchKind>) -> f64 {
    let (mut hit, mut total) = (0usize, 0usize);
    for kind in kinds {
        total += 1;
        if kind.counts() {
            hit += 1;
        }
    }
    if total == 0 {
        1.0
    } else {
        hit as f64 / total as f64
    }
}

fn selected_value<'a>(selected: &'a BTreeMap<String, String>, dimension: &str) -> Option<&'a str> {
    selected
        .iter()
        .find(|(d, _)| same_name(d, dimension))
        .map(|(_, v)| v.as_str())
}

fn score_option(
    dimension: &str,
    target: &str,
    selected: &BTreeMap<String, String>,
    product: &Product,
    threshold: f64,
) -> OptionMatch {
    if product.dimension(dimension).is_some() {
        let chosen = selected_value(selected, dimension);
        let verdict = match chosen {
            Some(value) => compare(value, target, threshold),
            None => PhraseMatch::Miss(0.0),
        };
        return OptionMatch {
            dimension: dimension.to_string(),
            target: target.to_string(),
            chosen: chosen.map(str::to_string),
            via_attribute: None,
            kind: verdict.into(),
            similarity: verdict.similarity(),
        };
    }

    // The product fixes this property; look for it among its attributes,
    // either as "dimension:value" or as the bare value.
    let qualified = format!("{dimension}:{target}");
    let attrs = || product.attributes.iter().map(String::as_str);
    let best = [
        best_match(attrs(), &qualified, threshold),
        best_match(attrs(), target, threshold),
    ]
    .into_iter()
    .flatten()
    .max_by(|a, b| rank(&a.1).total_cmp(&rank(&b.1)));

    match best {
        Some((idx, verdict)) => OptionMatch {
            dimension: dimension.to_string(),
            target: target.to_string(),
            chosen: None,
            via_attribute: verdict
                .is_match()
                .then(|| product.attributes[idx].clone()),
            kind: verdict.into(),
            similarity: verdict.similarity(),
        },
        None => OptionMatch {
            dimension: dimension.to_string(),
            target: target.to_string(),
            chosen: None,
            via_attribute: None,
            kind: MatchKind::Missed,
            similarity: 0.0,
        },
    }
}

/// Exact verdicts outrank any fuzzy similarity.
fn rank(m: &PhraseMatch) -> f64 {
    match m {
        PhraseMatch::Exact => 2.0,
        other => other.similarity(),
    }
}

fn score_attribute(phrase: &str, product: &Product, threshold: f64) -> AttributeMatch {
    match best_match(product.attributes.iter().map(String::as_str), phrase, threshold) {
        Some((idx, verdict)) => AttributeMatch {
            phrase: phrase.to_string(),
            closest: Some(product.attributes[idx].clone()),
            kind: verdict.into(),
            similarity: verdict.similarity(),
        },
        None => AttributeMatch {
            phrase: phrase.to_string(),
            closest: None,
            kind: MatchKind::Missed,
            similarity: 0.0,
        },
    }
}

/// Score a purchase against a structured target.
pub fn score_target(
    selected: &BTreeMap<String, String>,
    product: &Product,
    target: &Target,
    config: &RewardConfig,
) -> ScoreResult {
    let threshold = config.fuzzy_threshold;

    let options: Vec<OptionMatch> = target
        .options
        .iter()
        .map(|(dim, value)| score_option(dim, value, selected, product, threshold))
        .collect();

    let attributes: Vec<AttributeMatch> = target
        .attributes
        .iter()
        .map(|phrase| score_attribute(phrase, product, threshold))
        .collect();

    let price_ok = target.price_ceiling.map(|ceiling| product.price <= ceiling);

    let matched_attributes = attributes
        .iter()
        .filter(|a| a.kind.counts())
        .map(|a| a.phrase.clone())
        .collect();

    let mut result = ScoreResult {
        product: product.id.clone(),
        reward: 0.0,
        success: false,
        options,
        attributes,
        matched_attributes,
        price_ok,
        fallback: false,
    };

    let mut numerator = config.option_weight * result.option_fraction()
        + config.attribute_weight * result.attribute_fraction();
    let mut denominator = config.option_weight + config.attribute_weight;
    if let Some(ok) = price_ok {
        numerator += config.price_weight * if ok { 1.0 } else { 0.0 };
        denominator += config.price_weight;
    }

    result.reward = if denominator > 0.0 {
        (numerator / denominator).clamp(0.0, 1.0)
    } else {
        0.0
    };
    result.success = result.reward >= config.success_threshold;
    result
}

/// Score a completed purchase for an instruction.
///
/// Instructions without a structured target fall back to relevance: reward 1
/// if the purchased product is among the index's top
/// [`RewardConfig::fallback_top_k`] hits for the instruction text, else 0.
pub fn score_purchase(
    selected: &BTreeMap<String, String>,
    product: &Product,
    instruction: &Instruction,
    index: &SearchIndex,
    config: &RewardConfig,
) -> ScoreResult {
    match &instruction.target {
        Some(target) => score_target(selected, product, target, config),
        None => {
            let relevant = index
                .query_ids(&instruction.text, config.fallback_top_k)
                .contains(&product.id);
            let reward = if relevant { 1.0 } else { 0.0 };
            ScoreResult {
                product: product.id.clone(),
                reward,
                success: reward >= config.success_threshold,
                options: Vec::new(),
                attributes: Vec::new(),
                matched_attributes: Vec::new(),
                price_ok: None,
                fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ProductRecord};

    fn product(options: &[(&str, &[&str])], attributes: &[&str], price: f64) -> Product {
        ProductRecord {
            id: Some("B001".into()),
            title: Some("Red shirt".into()),
            description: Some("cotton shirt".into()),
            price: Some(price),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            options: options
                .iter()
                .map(|(d, vs)| (d.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
            ..Default::default()
        }
        .into_product()
        .unwrap()
    }

    fn selected(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(d, v)| (d.to_string(), v.to_string()))
            .collect()
    }

    fn target(options: &[(&str, &str)], attributes: &[&str], ceiling: Option<f64>) -> Target {
        Target {
            options: selected(options),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            price_ceiling: ceiling,
        }
    }

    #[test]
    fn test_full_match_scores_one() {
        let p = product(&[("size", &["S", "M"])], &["color:red"], 10.0);
        let t = target(&[("color", "red"), ("size", "M")], &[], None);
        let r = score_target(&selected(&[("size", "M")]), &p, &t, &RewardConfig::default());
        assert_eq!(r.reward, 1.0);
        assert!(r.success);
        assert_eq!(r.options.len(), 2);
        assert!(r.options.iter().all(|o| o.kind == MatchKind::Matched));
        let color = r.options.iter().find(|o| o.dimension == "color").unwrap();
        assert_eq!(color.via_attribute.as_deref(), Some("color:red"));
    }

    #[test]
    fn test_wrong_option_lowers_reward() {
        let p = product(&[("size", &["S", "M"])], &["color:red"], 10.0);
        let t = target(&[("color", "red"), ("size", "M")], &[], None);
        let config = RewardConfig::default();
        let r = score_target(&selected(&[("size", "S")]), &p, &t, &config);
        assert!(r.reward < 1.0);
        assert!(!r.success);
        assert_eq!(r.option_fraction(), 0.5);
        let expected = (config.option_weight * 0.5 + config.attribute_weight)
            / (config.option_weight + config.attribute_weight);
        assert!((r.reward - expected).abs() < 1e-12);
        let size = r.options.iter().find(|o| o.dimension == "size").unwrap();
        assert_eq!(size.kind, MatchKind::Missed);
        assert_eq!(size.chosen.as_deref(), Some("S"));
    }

    #[test]
    fn test_fuzzy_option_counts_as_match() {
        let p = product(&[("size", &["Small", "Medium"])], &[], 10.0);
        let t = target(&[("size", "M")], &[], None);
        let r = score_target(&selected(&[("size", "Medium")]), &p, &t, &RewardConfig::default());
        assert_eq!(r.options[0].kind, MatchKind::PartiallyMatched);
        assert_eq!(r.reward, 1.0);
        assert!(r.success);
    }

    #[test]
    fn test_wrong_quantity_is_not_a_match() {
        let config = RewardConfig::default();
        for (chosen, wanted) in [
            ("pack of 3", "pack of 2"),
            ("size 11", "size 10"),
            ("16 oz", "12 oz"),
            ("64GB", "32GB"),
        ] {
            let p = product(&[("size", &[chosen, wanted])], &[], 10.0);
            let t = target(&[("size", wanted)], &[], None);
            let r = score_target(&selected(&[("size", chosen)]), &p, &t, &config);
            assert_eq!(r.options[0].kind, MatchKind::Missed, "{chosen} vs {wanted}");
            assert!(r.reward < 1.0);
            assert!(!r.success);
        }
    }

    #[test]
    fn test_wrong_quantity_attribute_is_not_a_match() {
        let p = product(&[], &["size:11"], 10.0);
        let t = target(&[("size", "10")], &[], None);
        let r = score_target(&BTreeMap::new(), &p, &t, &RewardConfig::default());
        assert_eq!(r.options[0].kind, MatchKind::Missed);
        assert!(r.options[0].via_attribute.is_none());
        assert!(!r.success);
    }

    #[test]
    fn test_no_target_dimensions_is_vacuous() {
        let p = product(&[], &["machine washable"], 10.0);
        let t = target(&[], &["machine washable"], None);
        let r = score_target(&BTreeMap::new(), &p, &t, &RewardConfig::default());
        assert_eq!(r.option_fraction(), 1.0);
        assert_eq!(r.reward, 1.0);
        assert_eq!(r.matched_attributes, vec!["machine washable".to_string()]);
    }

    #[test]
    fn test_missing_attribute_and_price() {
        let p = product(&[], &["cotton"], 30.0);
        let t = target(&[], &["cotton", "waterproof"], Some(20.0));
        let config = RewardConfig::default();
        let r = score_target(&BTreeMap::new(), &p, &t, &config);
        assert_eq!(r.price_ok, Some(false));
        assert_eq!(r.attribute_fraction(), 0.5);
        let expected = (config.option_weight + config.attribute_weight * 0.5)
            / (config.option_weight + config.attribute_weight + config.price_weight);
        assert!((r.reward - expected).abs() < 1e-12);
        assert!(!r.success);
    }

    #[test]
    fn test_price_within_ceiling() {
        let p = product(&[], &[], 19.99);
        let t = target(&[], &[], Some(20.0));
        let r = score_target(&BTreeMap::new(), &p, &t, &RewardConfig::default());
        assert_eq!(r.price_ok, Some(true));
        assert_eq!(r.reward, 1.0);
    }

    #[test]
    fn test_reward_bounds_and_success_flag() {
        let p = product(
            &[("size", &["S", "M", "L"]), ("color", &["red", "blue"])],
            &["cotton"],
            15.0,
        );
        let config = RewardConfig::default();
        let choices = [("S", "red"), ("M", "blue"), ("L", "red"), ("M", "red")];
        for (size, color) in choices {
            for ceiling in [None, Some(10.0), Some(20.0)] {
                let t = target(&[("size", "M"), ("color", "red")], &["cotton", "silk"], ceiling);
                let chosen = selected(&[("size", size), ("color", color)]);
                let r = score_target(&chosen, &p, &t, &config);
                assert!((0.0..=1.0).contains(&r.reward));
                assert_eq!(r.success, r.reward >= config.success_threshold);
            }
        }
    }

    #[test]
    fn test_free_text_fallback() {
        let catalog = Catalog::from_records(vec![
            ProductRecord {
                id: Some("A1".into()),
                title: Some("Espresso machine".into()),
                description: Some(String::new()),
                price: Some(100.0),
                ..Default::default()
            },
            ProductRecord {
                id: Some("A2".into()),
                title: Some("Garden hose".into()),
                description: Some(String::new()),
                price: Some(10.0),
                ..Default::default()
            },
        ])
        .unwrap();
        let index = SearchIndex::build(&catalog);
        let instruction = Instruction::free_text("an espresso machine please");
        let config = RewardConfig::default();

        let hit = catalog.get(&"A1".into()).unwrap();
        let r = score_purchase(&BTreeMap::new(), hit, &instruction, &index, &config);
        assert!(r.fallback);
        assert_eq!(r.reward, 1.0);
        assert!(r.success);

        let miss = catalog.get(&"A2".into()).unwrap();
        let r = score_purchase(&BTreeMap::new(), miss, &instruction, &index, &config);
        assert_eq!(r.reward, 0.0);
        assert!(!r.success);
    }

    #[test]
    fn test_unselected_dimension_is_missed() {
        let p = product(&[("size", &["S", "M"])], &[], 10.0);
        let t = target(&[("size", "M")], &[], None);
        let r = score_target(&BTreeMap::new(), &p, &t, &RewardConfig::default());
        assert_eq!(r.options[0].kind, MatchKind::Missed);
        assert!(r.options[0].chosen.is_none());
    }
}
