//! Environment facade over the shopping session.
//!
//! - [`traits`] -- the [`Environment`] trait and [`Transition`].
//! - [`shop`] -- [`ShopEnv`], the reset/step contract over a shared catalog
//!   and index, plus the text action adapter.

pub mod shop;
pub mod traits;

pub use shop::ShopEnv;
pub use traits::{Environment, StepInfo, Transition};
