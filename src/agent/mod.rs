//! Baseline policies for driving the shop environment.
//!
//! - [`ScriptedPolicy`] replays a fixed action list.
//! - [`RandomPolicy`] picks uniformly among the legal actions with a seeded RNG.

pub mod policy;

pub use policy::{RandomPolicy, ScriptedPolicy};
