//! Episode scoring.
//!
//! The scorer is a pure function of the purchase and the instruction; see
//! [`scorer`] for the reward formula and matching policy.

pub mod scorer;

pub use scorer::{
    score_purchase, score_target, AttributeMatch, MatchKind, OptionMatch, ScoreResult,
    ATTRIBUTE_WEIGHT, FALLBACK_TOP_K, OPTION_WEIGHT, PRICE_WEIGHT, SUCCESS_THRESHOLD,
};
