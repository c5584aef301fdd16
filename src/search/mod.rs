//! Lexical product retrieval.

pub mod index;

pub use index::{Posting, SearchHit, SearchIndex};
