//! Trajectory types and collection for recording policy-environment interactions.
//!
//! This module provides:
//! - [`types::Step`], [`types::Trajectory`], [`types::TrajectoryMetadata`] -- the
//!   data structures that capture what happened during an episode.
//! - [`types::TrajectoryBuffer`] -- an accumulation buffer with outcome filters,
//!   summary statistics and JSON persistence.
//! - [`collector::TrajectoryCollector`] -- the loop that drives a policy through
//!   an environment and records trajectories.

pub mod collector;
pub mod types;

pub use collector::{AgentPolicy, TrajectoryCollector};
pub use types::{Step, Trajectory, TrajectoryBuffer, TrajectoryMetadata};
