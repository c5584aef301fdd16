//! The session state machine.
//!
//! [`Session::apply`] checks the action against the current page's legal set
//! ([`PageKind::permits`]), dispatches on the action, and records the attempt
//! in the history whether or not it was accepted. Rejected actions leave the
//! page, product and selection untouched.

use std::sync::Arc;

use super::action::Action;
use super::observation::{accepts_query, available_actions, render, Observation};
use super::state::{HistoryEntry, PageKind, Purchase, Rejection, SessionState};
use crate::catalog::{Catalog, Instruction, Product};
use crate::config::{RewardConfig, SearchConfig};
use crate::reward::{score_purchase, ScoreResult};
use crate::search::SearchIndex;

/// One episode's state machine over a shared catalog and index.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    index: Arc<SearchIndex>,
    search: SearchConfig,
    reward: RewardConfig,
    instruction: Instruction,
    state: SessionState,
}

impl Session {
    /// Start a new episode on the search page.
    pub fn new(
        catalog: Arc<Catalog>,
        index: Arc<SearchIndex>,
        instruction: Instruction,
        search: SearchConfig,
        reward: RewardConfig,
    ) -> Self {
        Self {
            catalog,
            index,
            search,
            reward,
            instruction,
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        self.state.score.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.state.terminal
    }

    /// Render the current page without applying anything.
    pub fn observe(&self, rejection: Option<Rejection>) -> Observation {
        let text = render(
            &self.state,
            &self.catalog,
            &self.instruction,
            self.search.page_size,
            rejection.as_ref(),
        );
        Observation {
            page: self.state.page,
            text,
            available_actions: available_actions(&self.state, &self.catalog, self.search.page_size),
            accepts_query: accepts_query(self.state.page),
            rejection,
        }
    }

    /// Apply an action and return the resulting observation.
    ///
    /// The attempt is appended to the history before the observation is
    /// returned, accepted or not.
    pub fn apply(&mut self, action: Action) -> Observation {
        let rejection = self.transition(&action).err();

        match &rejection {
            Some(reason) => tracing::debug!(
                action = %action,
                page = %self.state.page,
                reason = %reason,
                "Rejected action"
            ),
            None => tracing::debug!(action = %action, page = %self.state.page, "Applied action"),
        }

        let observation = self.observe(rejection.clone());
        self.state.history.push(HistoryEntry {
            action,
            rejection,
            page: self.state.page,
            observation: observation.text.clone(),
        });
        observation
    }

    fn transition(&mut self, action: &Action) -> Result<(), Rejection> {
        let page = self.state.page;
        let kind = action.kind();
        if !page.permits(kind) {
            return Err(Rejection::IllegalForPage { action: kind, page });
        }

        // Cloned so product lookups don't hold a borrow of `self`.
        let catalog = Arc::clone(&self.catalog);

        match action {
            Action::SubmitQuery { query } | Action::SearchAgain { query } => {
                self.state.results = self.index.query(query, self.search.results_top_k);
                self.state.last_query = Some(query.clone());
                self.state.results_page = 0;
                self.state.page = PageKind::Results;
            }
            Action::ClickProduct { id } => {
                if !self.state.result_ids().any(|r| r == id) || !catalog.contains(id) {
                    return Err(Rejection::UnknownProduct { id: id.clone() });
                }
                self.state.product = Some(id.clone());
                self.state.selected.clear();
                self.state.sub_page = None;
                self.state.page = PageKind::Item;
            }
            Action::NextPage => {
                if !self.state.has_next_page(self.search.page_size) {
                    return Err(Rejection::NoNextPage);
                }
                self.state.results_page += 1;
            }
            Action::PrevPage => {
                if self.state.results_page == 0 {
                    return Err(Rejection::NoPrevPage);
                }
                self.state.results_page -= 1;
            }
            Action::SelectOption { dimension, value } => {
                let product = self.current_product(&catalog, kind)?;
                if product.dimension(dimension).is_none() {
                    return Err(Rejection::UnknownDimension {
                        dimension: dimension.clone(),
                    });
                }
                let (dim, val) = product.resolve_option(dimension, value).ok_or_else(|| {
                    Rejection::UnknownOptionValue {
                        dimension: dimension.clone(),
                        value: value.clone(),
                    }
                })?;
                self.state.selected.insert(dim.to_string(), val.to_string());
            }
            Action::ViewSubPage { page: sub_page } => {
                self.state.sub_page = Some(*sub_page);
                self.state.page = PageKind::ItemSubPage;
            }
            Action::ClickBuy => {
                let product = self.current_product(&catalog, kind)?;
                let missing: Vec<String> = product
                    .dimensions()
                    .filter(|d| !self.state.selected.contains_key(*d))
                    .map(str::to_string)
                    .collect();
                if !missing.is_empty() {
                    return Err(Rejection::MissingOptions {
                        dimensions: missing,
                    });
                }
                self.purchase(product);
            }
            Action::Back => match page {
                PageKind::Item => {
                    self.state.product = None;
                    self.state.selected.clear();
                    self.state.sub_page = None;
                    self.state.page = PageKind::Results;
                }
                _ => {
                    self.state.sub_page = None;
                    self.state.page = PageKind::Item;
                }
            },
        }

        Ok(())
    }

    fn current_product<'c>(
        &self,
        catalog: &'c Catalog,
        kind: super::action::ActionKind,
    ) -> Result<&'c Product, Rejection> {
        self.state
            .product
            .as_ref()
            .and_then(|id| catalog.get(id))
            .ok_or(Rejection::IllegalForPage {
                action: kind,
                page: self.state.page,
            })
    }

    fn purchase(&mut self, product: &Product) {
        if self.state.score.is_some() {
            return;
        }

        let score = score_purchase(
            &self.state.selected,
            product,
            &self.instruction,
            &self.index,
            &self.reward,
        );

        tracing::info!(
            product = %product.id,
            reward = score.reward,
            success = score.success,
            "Purchase scored"
        );

        self.state.purchase = Some(Purchase {
            product: product.id.clone(),
            options: std::mem::take(&mut self.state.selected),
        });
        self.state.score = Some(score);
        self.state.product = None;
        self.state.sub_page = None;
        self.state.page = PageKind::Done;
        self.state.terminal = true;
    }
}
