//! Text processing shared by the index and the reward scorer.
//!
//! - [`normalize`] -- tokenizer used identically at index and query time.
//! - [`fuzzy`] -- similarity scoring for option values and attribute phrases.

pub mod fuzzy;
pub mod normalize;

pub use fuzzy::{compare, is_match, similarity, PhraseMatch, FUZZY_MATCH_THRESHOLD};
pub use normalize::{canonical_phrase, normalize, normalize_to_text, normalized_text, same_name};
