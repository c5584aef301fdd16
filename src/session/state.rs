//! Per-episode session state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::{Action, ActionKind, SubPage};
use crate::catalog::ProductId;
use crate::reward::ScoreResult;
use crate::search::SearchHit;

/// Which page the agent is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Search,
    Results,
    Item,
    ItemSubPage,
    Done,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Results => "results",
            Self::Item => "item",
            Self::ItemSubPage => "item_sub_page",
            Self::Done => "done",
        }
    }

    /// The legality table: which action kinds each page accepts.
    pub fn permits(&self, kind: ActionKind) -> bool {
        use ActionKind as A;
        matches!(
            (self, kind),
            (PageKind::Search, A::SubmitQuery)
                | (
                    PageKind::Results,
                    A::ClickProduct | A::SearchAgain | A::NextPage | A::PrevPage
                )
                | (
                    PageKind::Item,
                    A::SelectOption | A::ViewSubPage | A::ClickBuy | A::Back
                )
                | (PageKind::ItemSubPage, A::Back)
        )
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action was rejected. Rejected actions change nothing but are still
/// recorded in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The action is not in the current page's legal set.
    IllegalForPage { action: ActionKind, page: PageKind },
    /// The product is not in the current result list.
    UnknownProduct { id: ProductId },
    /// The current product has no such option dimension.
    UnknownDimension { dimension: String },
    /// The dimension exists but does not offer this value.
    UnknownOptionValue { dimension: String, value: String },
    /// Buy was clicked with option dimensions still unselected.
    MissingOptions { dimensions: Vec<String> },
    /// Next page requested on the last results page.
    NoNextPage,
    /// Previous page requested on the first results page.
    NoPrevPage,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalForPage { action, page } => {
                write!(f, "{action} is not available on the {page} page")
            }
            Self::UnknownProduct { id } => write!(f, "product {id} is not in the results"),
            Self::UnknownDimension { dimension } => {
                write!(f, "this product has no '{dimension}' option")
            }
            Self::UnknownOptionValue { dimension, value } => {
                write!(f, "'{value}' is not a valid {dimension}")
            }
            Self::MissingOptions { dimensions } => {
                write!(f, "select {} before buying", dimensions.join(", "))
            }
            Self::NoNextPage => f.write_str("already on the last page"),
            Self::NoPrevPage => f.write_str("already on the first page"),
        }
    }
}

/// One recorded step of the episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: Action,
    /// `None` when the action was applied.
    pub rejection: Option<Rejection>,
    /// Page after the action was processed.
    pub page: PageKind,
    /// Observation text returned for this action.
    pub observation: String,
}

impl HistoryEntry {
    pub fn accepted(&self) -> bool {
        self.rejection.is_none()
    }
}

/// The configuration bought at the end of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub product: ProductId,
    pub options: BTreeMap<String, String>,
}

/// Mutable state of one episode. Never shared between episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub page: PageKind,
    /// Set only on [`PageKind::Item`] and [`PageKind::ItemSubPage`].
    pub product: Option<ProductId>,
    pub sub_page: Option<SubPage>,
    /// Dimension -> chosen value for the current product.
    pub selected: BTreeMap<String, String>,
    pub last_query: Option<String>,
    pub results: Vec<SearchHit>,
    /// Zero-based results page.
    pub results_page: usize,
    pub history: Vec<HistoryEntry>,
    pub terminal: bool,
    /// Set on the transition to [`PageKind::Done`].
    pub purchase: Option<Purchase>,
    /// Set exactly once, on the transition to [`PageKind::Done`].
    pub score: Option<ScoreResult>,
}

impl SessionState {
    /// A fresh episode on the search page.
    pub fn new() -> Self {
        Self {
            page: PageKind::Search,
            product: None,
            sub_page: None,
            selected: BTreeMap::new(),
            last_query: None,
            results: Vec::new(),
            results_page: 0,
            history: Vec::new(),
            terminal: false,
            purchase: None,
            score: None,
        }
    }

    /// Ids in the current result list, best first.
    pub fn result_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.results.iter().map(|hit| &hit.id)
    }

    /// Hits shown on the current results page. A page size of zero is
    /// treated as one.
    pub fn page_hits(&self, page_size: usize) -> &[SearchHit] {
        let page_size = page_size.max(1);
        let start = (self.results_page * page_size).min(self.results.len());
        let end = (start + page_size).min(self.results.len());
        &self.results[start..end]
    }

    /// Whether another results page follows the current one.
    pub fn has_next_page(&self, page_size: usize) -> bool {
        (self.results_page + 1) * page_size.max(1) < self.results.len()
    }

    pub fn num_results_pages(&self, page_size: usize) -> usize {
        self.results.len().div_ceil(page_size.max(1)).max(1)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
