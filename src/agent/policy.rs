//! Baseline [`AgentPolicy`] implementations.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::catalog::Instruction;
use crate::session::{Action, Observation, PageKind, ParseActionError};
use crate::trajectory::AgentPolicy;

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// Replays the same action list every episode.
#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    actions: Vec<Action>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions, cursor: 0 }
    }

    /// Build from text actions such as `search[red shirt]`.
    pub fn from_text<S: AsRef<str>>(lines: &[S]) -> Result<Self, ParseActionError> {
        let actions = lines
            .iter()
            .map(|l| l.as_ref().parse())
            .collect::<Result<Vec<Action>, _>>()?;
        Ok(Self::new(actions))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl AgentPolicy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    fn begin_episode(&mut self, _instruction: &Instruction) {
        self.cursor = 0;
    }

    fn select_action(&mut self, _task: &str, _observation: &Observation) -> Result<Action> {
        let Some(action) = self.actions.get(self.cursor) else {
            bail!("script exhausted after {} actions", self.actions.len());
        };
        self.cursor += 1;
        Ok(action.clone())
    }
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

/// Uniform choice over the enumerable legal actions.
///
/// Queries always use the instruction text. On a results page with nothing to
/// click the policy searches again.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    seed: u64,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl AgentPolicy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn select_action(&mut self, task: &str, observation: &Observation) -> Result<Action> {
        if observation.page == PageKind::Search {
            return Ok(Action::submit_query(task));
        }
        if let Some(action) = observation.available_actions.choose(&mut self.rng) {
            return Ok(action.clone());
        }
        if observation.accepts_query {
            return Ok(Action::search_again(task));
        }
        bail!("no legal action on the {} page", observation.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::config::ShopConfig;
    use crate::env::{Environment, ShopEnv};
    use crate::trajectory::TrajectoryCollector;

    fn env() -> ShopEnv {
        ShopEnv::from_catalog(fixtures::shop_catalog(), ShopConfig::default())
    }

    #[test]
    fn test_scripted_policy_buys() {
        let mut policy = ScriptedPolicy::from_text(&[
            "search[red shirt]",
            "click[B001]",
            "select[size: L]",
            "click[buy now]",
        ])
        .unwrap();
        assert_eq!(policy.len(), 4);

        let t = TrajectoryCollector::new("shopsim")
            .run_episode(&mut env(), &mut policy, &Instruction::free_text("red shirt"))
            .unwrap();
        assert!(t.success);
        assert_eq!(t.steps.len(), 4);
        assert_eq!(t.rejected_steps(), 0);
    }

    #[test]
    fn test_scripted_policy_restarts_each_episode() {
        let mut policy = ScriptedPolicy::from_text(&["search[jacket]", "click[B002]"]).unwrap();
        let goal = Instruction::free_text("jacket");
        let obs = env().reset(goal.clone());

        policy.begin_episode(&goal);
        policy.select_action("jacket", &obs).unwrap();
        policy.begin_episode(&goal);
        assert_eq!(
            policy.select_action("jacket", &obs).unwrap(),
            Action::submit_query("jacket")
        );
    }

    #[test]
    fn test_scripted_policy_exhausted() {
        let mut policy = ScriptedPolicy::from_text(&["search[jacket]"]).unwrap();
        let err = TrajectoryCollector::new("shopsim")
            .run_episode(&mut env(), &mut policy, &Instruction::free_text("jacket"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("script exhausted"));
    }

    #[test]
    fn test_scripted_policy_rejects_bad_text() {
        assert!(ScriptedPolicy::from_text(&["search[ok]", "fly[away]"]).is_err());
    }

    #[test]
    fn test_random_policy_is_deterministic_per_seed() {
        let goal = Instruction::free_text("denim jacket");
        let collector = TrajectoryCollector::new("shopsim");

        let run = |seed| {
            let t = collector
                .run_episode(&mut env(), &mut RandomPolicy::new(seed), &goal)
                .unwrap();
            t.steps.into_iter().map(|s| s.action).collect::<Vec<_>>()
        };

        assert_eq!(run(7), run(7));
        assert_eq!(RandomPolicy::new(7).seed(), 7);
    }

    #[test]
    fn test_random_policy_only_picks_offered_actions() {
        let goal = Instruction::free_text("shirt");
        let mut env = env();
        let mut policy = RandomPolicy::new(3);
        let mut obs = env.reset(goal.clone());

        while !env.is_done() {
            let action = policy.select_action(&goal.text, &obs).unwrap();
            if obs.page != PageKind::Search {
                assert!(
                    obs.available_actions.contains(&action)
                        || action == Action::search_again(&goal.text)
                );
            }
            let t = env.step(action).unwrap();
            obs = t.observation;
        }
    }
}
