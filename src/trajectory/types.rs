//! Recorded episodes and the buffer that accumulates them.
//!
//! A [`Trajectory`] is what `rollout` writes to disk: the instruction, every
//! step the policy took, and the final score.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductId;
use crate::reward::ScoreResult;
use crate::session::Action;

// ---------------------------------------------------------------------------
// Single step
// ---------------------------------------------------------------------------

/// A single step within a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The observation text the policy acted on.
    pub observation: String,
    pub action: Action,
    /// Whether the session applied the action (false for rejected actions).
    pub accepted: bool,
    /// The reward for this transition.
    pub reward: f64,
    /// Zero-based index of this step within the trajectory.
    pub step_index: usize,
}

// ---------------------------------------------------------------------------
// Trajectory metadata
// ---------------------------------------------------------------------------

/// Auxiliary metadata attached to every trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMetadata {
    /// Label of the environment that produced this trajectory.
    pub environment: String,
    /// Name of the policy that acted.
    pub policy: String,
    /// Id of the instruction, when the goals file carried one.
    pub instruction_id: Option<String>,
    /// Number of steps in the trajectory (same as `steps.len()`).
    pub num_steps: usize,
    /// The step budget ran out before a purchase.
    pub truncated: bool,
    pub purchased: Option<ProductId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Full trajectory
// ---------------------------------------------------------------------------

/// A complete trajectory recording one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// The instruction text the policy was solving.
    pub task_description: String,
    pub steps: Vec<Step>,
    /// Total accumulated reward over the episode.
    pub total_reward: f64,
    pub success: bool,
    /// Present when the episode ended in a purchase.
    pub score: Option<ScoreResult>,
    pub metadata: TrajectoryMetadata,
}

impl Trajectory {
    /// Number of steps whose action was rejected.
    pub fn rejected_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.accepted).count()
    }
}

// ---------------------------------------------------------------------------
// Trajectory buffer
// ---------------------------------------------------------------------------

/// A buffer for accumulating trajectories during collection.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryBuffer {
    trajectories: Vec<Trajectory>,
}

impl TrajectoryBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            trajectories: Vec::new(),
        }
    }

    /// Create a buffer pre-allocated for `capacity` trajectories.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            trajectories: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn push(&mut self, trajectory: Trajectory) {
        self.trajectories.push(trajectory);
    }

    pub fn as_slice(&self) -> &[Trajectory] {
        &self.trajectories
    }

    /// Trajectories that ended in a successful purchase.
    pub fn successful(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter().filter(|t| t.success)
    }

    /// Trajectories that were truncated or bought the wrong thing.
    pub fn failed(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter().filter(|t| !t.success)
    }

    /// Overall success rate across all buffered trajectories.
    pub fn success_rate(&self) -> f64 {
        if self.trajectories.is_empty() {
            return 0.0;
        }
        self.successful().count() as f64 / self.trajectories.len() as f64
    }

    /// Mean total reward (0 for an empty buffer).
    pub fn mean_reward(&self) -> f64 {
        if self.trajectories.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trajectories.iter().map(|t| t.total_reward).sum();
        sum / self.trajectories.len() as f64
    }

    /// Write all trajectories as a pretty-printed JSON array.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.trajectories)
            .context("failed to serialize trajectories")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write trajectories to {}", path.display()))?;
        tracing::info!(path = %path.display(), count = self.len(), "Saved trajectories");
        Ok(())
    }

    /// Load a buffer previously written by [`save_json`](Self::save_json).
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read trajectories from {}", path.display()))?;
        let trajectories: Vec<Trajectory> = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse trajectories in {}", path.display()))?;
        Ok(Self { trajectories })
    }
}

impl FromIterator<Trajectory> for TrajectoryBuffer {
    fn from_iter<I: IntoIterator<Item = Trajectory>>(iter: I) -> Self {
        Self {
            trajectories: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(reward: f64, success: bool) -> Trajectory {
        let now = Utc::now();
        Trajectory {
            id: uuid::Uuid::new_v4().to_string(),
            task_description: "a red shirt".into(),
            steps: vec![
                Step {
                    observation: "[Search]".into(),
                    action: Action::submit_query("red shirt"),
                    accepted: true,
                    reward: 0.0,
                    step_index: 0,
                },
                Step {
                    observation: "Results".into(),
                    action: Action::ClickBuy,
                    accepted: false,
                    reward: 0.0,
                    step_index: 1,
                },
            ],
            total_reward: reward,
            success,
            score: None,
            metadata: TrajectoryMetadata {
                environment: "shopsim".into(),
                policy: "scripted".into(),
                instruction_id: Some("goal-1".into()),
                num_steps: 2,
                truncated: false,
                purchased: None,
                started_at: now,
                finished_at: now,
            },
        }
    }

    #[test]
    fn test_buffer_stats() {
        let mut buffer = TrajectoryBuffer::new();
        assert_eq!(buffer.success_rate(), 0.0);
        assert_eq!(buffer.mean_reward(), 0.0);

        for (reward, success) in [(1.0, true), (0.5, false), (0.0, false)] {
            buffer.push(trajectory(reward, success));
        }
        assert_eq!(buffer.len(), 3);
        assert!((buffer.success_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert!((buffer.mean_reward() - 0.5).abs() < 1e-9);
        assert_eq!(buffer.successful().count(), 1);
        let failed: Vec<f64> = buffer.failed().map(|t| t.total_reward).collect();
        assert_eq!(failed, vec![0.5, 0.0]);
    }

    #[test]
    fn test_rejected_steps() {
        assert_eq!(trajectory(0.0, false).rejected_steps(), 1);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectories.json");

        let buffer: TrajectoryBuffer = vec![trajectory(1.0, true), trajectory(0.2, false)]
            .into_iter()
            .collect();
        buffer.save_json(&path).unwrap();

        let loaded = TrajectoryBuffer::load_json(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        let ids: Vec<&str> = loaded.as_slice().iter().map(|t| t.id.as_str()).collect();
        let expected: Vec<&str> = buffer.as_slice().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert_eq!(loaded.as_slice()[0].steps, buffer.as_slice()[0].steps);
        assert_eq!(loaded.as_slice()[0].metadata, buffer.as_slice()[0].metadata);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrajectoryBuffer::load_json(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read trajectories"));
    }
}
