//! Trajectory collection: orchestrating policy-environment interaction loops.
//!
//! The [`TrajectoryCollector`] drives episodes by repeatedly:
//!   1. presenting the observation to the policy,
//!   2. receiving the policy's action,
//!   3. stepping the environment,
//!   4. recording the (observation, action, reward) tuple.
//!
//! Collection is synchronous; the CLI runs several collectors in parallel on
//! blocking tasks, each with its own environment over the shared index.

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::catalog::Instruction;
use crate::env::Environment;
use crate::session::{Action, Observation};
use crate::trajectory::types::{Step, Trajectory, TrajectoryMetadata};

// ---------------------------------------------------------------------------
// Policy trait (minimal interface the collector needs)
// ---------------------------------------------------------------------------

/// Something that picks the next action from an observation.
pub trait AgentPolicy {
    /// Short label written into trajectory metadata.
    fn name(&self) -> &str;

    /// Called once before each episode. The default does nothing.
    fn begin_episode(&mut self, _instruction: &Instruction) {}

    /// Choose the next action. `task` is the instruction text.
    fn select_action(&mut self, task: &str, observation: &Observation) -> Result<Action>;
}

// ---------------------------------------------------------------------------
// Trajectory collector
// ---------------------------------------------------------------------------

/// Runs a policy inside an environment and records what happened.
#[derive(Debug, Clone)]
pub struct TrajectoryCollector {
    /// Label for the environment type (written into trajectory metadata).
    env_label: String,
}

impl TrajectoryCollector {
    pub fn new(env_label: &str) -> Self {
        Self {
            env_label: env_label.to_string(),
        }
    }

    /// Run one episode per instruction, in order.
    pub fn collect_episodes<E, P>(
        &self,
        env: &mut E,
        policy: &mut P,
        instructions: &[Instruction],
    ) -> Result<Vec<Trajectory>>
    where
        E: Environment,
        P: AgentPolicy,
    {
        let mut trajectories = Vec::with_capacity(instructions.len());

        for (ep, instruction) in instructions.iter().enumerate() {
            let trajectory = self.run_episode(env, policy, instruction)?;
            tracing::info!(
                episode = ep,
                steps = trajectory.steps.len(),
                reward = trajectory.total_reward,
                success = trajectory.success,
                "collected episode"
            );
            trajectories.push(trajectory);
        }

        Ok(trajectories)
    }

    /// Run a single episode from reset until the environment reports done.
    pub fn run_episode<E, P>(
        &self,
        env: &mut E,
        policy: &mut P,
        instruction: &Instruction,
    ) -> Result<Trajectory>
    where
        E: Environment,
        P: AgentPolicy,
    {
        let started_at = Utc::now();
        policy.begin_episode(instruction);
        let mut current_obs = env.reset(instruction.clone());
        let task_description = env.task_description().to_string();

        let mut steps: Vec<Step> = Vec::new();
        let mut total_reward = 0.0;
        let mut score = None;
        let mut truncated = false;

        for step_index in 0..env.max_steps() {
            if env.is_done() {
                break;
            }

            let action = policy
                .select_action(&task_description, &current_obs)
                .with_context(|| format!("{} failed to choose step {step_index}", policy.name()))?;

            let transition = env
                .step(action.clone())
                .context("environment rejected the episode step")?;

            steps.push(Step {
                observation: std::mem::take(&mut current_obs.text),
                action,
                accepted: transition.observation.rejection.is_none(),
                reward: transition.reward,
                step_index,
            });

            total_reward += transition.reward;
            truncated = transition.info.truncated;
            if transition.info.score.is_some() {
                score = transition.info.score;
            }
            current_obs = transition.observation;
        }

        let success = score.as_ref().is_some_and(|s| s.success);
        let purchased = score.as_ref().map(|s| s.product.clone());

        Ok(Trajectory {
            id: Uuid::new_v4().to_string(),
            task_description,
            total_reward,
            success,
            score,
            metadata: TrajectoryMetadata {
                environment: self.env_label.clone(),
                policy: policy.name().to_string(),
                instruction_id: instruction.id.clone(),
                num_steps: steps.len(),
                truncated,
                purchased,
                started_at,
                finished_at: Utc::now(),
            },
            steps,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
