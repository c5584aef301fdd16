use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::reward::{
    ATTRIBUTE_WEIGHT, FALLBACK_TOP_K, OPTION_WEIGHT, PRICE_WEIGHT, SUCCESS_THRESHOLD,
};
use crate::text::FUZZY_MATCH_THRESHOLD;

/// Complete configuration for a shopping environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub search: SearchConfig,
    pub session: SessionConfig,
    pub reward: RewardConfig,
}

/// Search and results-page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How many hits a query keeps for the results pages (default: 50).
    pub results_top_k: usize,
    /// Hits shown per results page (default: 10).
    pub page_size: usize,
}

/// Per-episode limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of steps before the episode is truncated (default: 15).
    pub max_steps: usize,
}

/// Reward scorer weights and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Weight of the option-match fraction (default: 0.5).
    pub option_weight: f64,
    /// Weight of the attribute-match fraction (default: 0.3).
    pub attribute_weight: f64,
    /// Weight of the price check when a ceiling is set (default: 0.2).
    pub price_weight: f64,
    /// Similarity a phrase must exceed to count as a fuzzy match (default: 0.8).
    pub fuzzy_threshold: f64,
    /// Reward at or above which a purchase counts as a success (default: 1.0).
    pub success_threshold: f64,
    /// Depth of the relevance check for free-text instructions (default: 10).
    pub fallback_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_top_k: 50,
            page_size: 10,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_steps: 15 }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            option_weight: OPTION_WEIGHT,
            attribute_weight: ATTRIBUTE_WEIGHT,
            price_weight: PRICE_WEIGHT,
            fuzzy_threshold: FUZZY_MATCH_THRESHOLD,
            success_threshold: SUCCESS_THRESHOLD,
            fallback_top_k: FALLBACK_TOP_K,
        }
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            session: SessionConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl ShopConfig {
    /// Read a JSON config file. Missing sections and fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 {
            bail!("search.page_size must be at least 1");
        }
        if self.session.max_steps == 0 {
            bail!("session.max_steps must be at least 1");
        }

        let r = &self.reward;
        for (name, w) in [
            ("option_weight", r.option_weight),
            ("attribute_weight", r.attribute_weight),
            ("price_weight", r.price_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                bail!("reward.{name} must be a non-negative number, got {w}");
            }
        }
        if r.option_weight + r.attribute_weight <= 0.0 {
            bail!("reward.option_weight and reward.attribute_weight cannot both be zero");
        }
        for (name, t) in [
            ("fuzzy_threshold", r.fuzzy_threshold),
            ("success_threshold", r.success_threshold),
        ] {
            if !(0.0..=1.0).contains(&t) {
                bail!("reward.{name} must lie in [0, 1], got {t}");
            }
        }
        Ok(())
    }
}
