//! The shopping environment.
//!
//! [`ShopEnv`] owns at most one live [`Session`] and shares the catalog and
//! index with every other environment by `Arc`. The action space is the typed
//! [`Action`] enum; [`ShopEnv::step_text`] accepts the WebShop-style text form
//! (`search[..]`, `click[..]`, `select[..: ..]`).

use std::sync::Arc;

use anyhow::{Context, Result};

use super::traits::{Environment, StepInfo, Transition};
use crate::catalog::{Catalog, Instruction};
use crate::config::ShopConfig;
use crate::error::EnvError;
use crate::reward::ScoreResult;
use crate::search::SearchIndex;
use crate::session::{Action, HistoryEntry, Observation, PageKind, Session};

/// A shopping environment over a shared catalog and index.
#[derive(Debug, Clone)]
pub struct ShopEnv {
    catalog: Arc<Catalog>,
    index: Arc<SearchIndex>,
    config: ShopConfig,
    session: Option<Session>,
    steps: usize,
    truncated: bool,
}

impl ShopEnv {
    pub fn new(catalog: Arc<Catalog>, index: Arc<SearchIndex>, config: ShopConfig) -> Self {
        Self {
            catalog,
            index,
            config,
            session: None,
            steps: 0,
            truncated: false,
        }
    }

    /// Build the index for `catalog` and wrap both.
    pub fn from_catalog(catalog: Catalog, config: ShopConfig) -> Self {
        let index = SearchIndex::build(&catalog);
        Self::new(Arc::new(catalog), Arc::new(index), config)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// The live session, if [`Environment::reset`] has been called.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.session.as_ref().map(Session::instruction)
    }

    /// Every action attempted this episode, in order.
    pub fn history(&self) -> &[HistoryEntry] {
        self.session.as_ref().map(Session::history).unwrap_or_default()
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        self.session.as_ref().and_then(Session::score)
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// Re-render the current page.
    pub fn observe(&self) -> Result<Observation, EnvError> {
        self.session
            .as_ref()
            .map(|s| s.observe(None))
            .ok_or(EnvError::NotReset)
    }

    /// Parse a text action and step with it.
    ///
    /// `search[..]` on a results page is taken as search-again.
    pub fn step_text(&mut self, text: &str) -> Result<Transition> {
        let mut action: Action = text
            .parse()
            .with_context(|| format!("invalid action '{text}'"))?;

        if let Action::SubmitQuery { query } = &action {
            let on_results = self
                .session
                .as_ref()
                .is_some_and(|s| s.state().page == PageKind::Results);
            if on_results {
                action = Action::search_again(query.clone());
            }
        }

        Ok(self.step(action)?)
    }
}

impl Environment for ShopEnv {
    fn reset(&mut self, instruction: Instruction) -> Observation {
        tracing::debug!(
            instruction = %instruction.text,
            id = instruction.id.as_deref().unwrap_or(""),
            "Shop env reset"
        );

        let session = Session::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.index),
            instruction,
            self.config.search.clone(),
            self.config.reward.clone(),
        );
        let observation = session.observe(None);
        self.session = Some(session);
        self.steps = 0;
        self.truncated = false;
        observation
    }

    fn step(&mut self, action: Action) -> Result<Transition, EnvError> {
        let session = self.session.as_mut().ok_or(EnvError::NotReset)?;
        if session.is_done() || self.truncated {
            return Err(EnvError::EpisodeFinished);
        }

        self.steps += 1;
        let observation = session.apply(action);

        let purchased = session.is_done();
        self.truncated = !purchased && self.steps >= self.config.session.max_steps;
        let score = if purchased { session.score().cloned() } else { None };
        let reward = score.as_ref().map_or(0.0, |s| s.reward);
        let done = purchased || self.truncated;

        tracing::debug!(
            step = self.steps,
            page = %observation.page,
            rejected = observation.rejection.is_some(),
            "Shop env step"
        );

        if done {
            tracing::info!(
                steps = self.steps,
                reward,
                success = score.as_ref().is_some_and(|s| s.success),
                truncated = self.truncated,
                "Episode finished"
            );
        }

        Ok(Transition {
            observation,
            reward,
            done,
            info: StepInfo {
                score,
                truncated: self.truncated,
                step: self.steps,
            },
        })
    }

    fn task_description(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.instruction().text.as_str())
            .unwrap_or_default()
    }

    fn max_steps(&self) -> usize {
        self.config.session.max_steps
    }

    fn is_done(&self) -> bool {
        self.truncated || self.session.as_ref().is_some_and(Session::is_done)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
