//! shopsim: an interactive shopping simulation for evaluating web agents.
//!
//! An agent receives a natural-language shopping instruction, searches a
//! product catalog, inspects items, selects options and buys. The purchase is
//! scored against the instruction's structured target by fuzzy attribute and
//! option matching.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod env;
pub mod error;
pub mod reward;
pub mod search;
pub mod session;
pub mod text;
pub mod trajectory;
