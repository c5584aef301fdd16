//! Core environment trait and shared types.
//!
//! The trajectory collector and the CLI drive episodes through the
//! [`Environment`] trait, so policies never touch session internals.

use serde::{Deserialize, Serialize};

use crate::catalog::Instruction;
use crate::error::EnvError;
use crate::reward::ScoreResult;
use crate::session::{Action, Observation};

/// Extra information attached to a transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Present only on the transition that entered the done page.
    pub score: Option<ScoreResult>,
    /// The step budget ran out before a purchase.
    pub truncated: bool,
    /// Steps taken in this episode, including this one.
    pub step: usize,
}

/// The result of one [`Environment::step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub observation: Observation,
    /// Zero on every step except the one that completes a purchase.
    pub reward: f64,
    /// Whether the episode has terminated (purchase or truncation).
    pub done: bool,
    pub info: StepInfo,
}

/// The core environment trait.
pub trait Environment {
    /// Start a new episode for `instruction` and return the search page.
    fn reset(&mut self, instruction: Instruction) -> Observation;

    /// Apply one action.
    ///
    /// Invalid actions are not errors: they come back as a rejected
    /// observation. Errors are reserved for misuse of the episode lifecycle.
    fn step(&mut self, action: Action) -> Result<Transition, EnvError>;

    /// The current episode's instruction text.
    fn task_description(&self) -> &str;

    /// The maximum number of steps allowed in an episode.
    fn max_steps(&self) -> usize;

    /// Whether the current episode has ended (purchase or truncation).
    fn is_done(&self) -> bool;
}
