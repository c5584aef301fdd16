//! What the agent sees after each action.
//!
//! Text rendering follows WebShop's text mode: bracketed clickables, one
//! section per page, and the instruction repeated at the top.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::action::{Action, SubPage};
use super::state::{PageKind, Rejection, SessionState};
use crate::catalog::{Catalog, Instruction, Product};

/// An observation returned by the session after a reset or an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub page: PageKind,
    /// The textual page the agent sees.
    pub text: String,
    /// Every enumerable legal action on this page.
    pub available_actions: Vec<Action>,
    /// Whether a free-text query action is legal on this page.
    pub accepts_query: bool,
    /// Set when the action that produced this observation was rejected.
    pub rejection: Option<Rejection>,
}

/// Legal actions that need no free text, in display order.
pub fn available_actions(state: &SessionState, catalog: &Catalog, page_size: usize) -> Vec<Action> {
    match state.page {
        PageKind::Search | PageKind::Done => Vec::new(),
        PageKind::Results => {
            let mut actions: Vec<Action> = state
                .page_hits(page_size)
                .iter()
                .map(|hit| Action::click_product(hit.id.clone()))
                .collect();
            if state.results_page > 0 {
                actions.push(Action::PrevPage);
            }
            if state.has_next_page(page_size) {
                actions.push(Action::NextPage);
            }
            actions
        }
        PageKind::Item => {
            let mut actions = Vec::new();
            if let Some(product) = state.product.as_ref().and_then(|id| catalog.get(id)) {
                for (dimension, values) in &product.options {
                    for value in values {
                        actions.push(Action::select_option(dimension.clone(), value.clone()));
                    }
                }
            }
            actions.extend(SubPage::ALL.into_iter().map(Action::view_sub_page));
            actions.push(Action::ClickBuy);
            actions.push(Action::Back);
            actions
        }
        PageKind::ItemSubPage => vec![Action::Back],
    }
}

/// Whether the page takes a free-text query.
pub fn accepts_query(page: PageKind) -> bool {
    matches!(page, PageKind::Search | PageKind::Results)
}

/// Render the page text for the current state.
pub fn render(
    state: &SessionState,
    catalog: &Catalog,
    instruction: &Instruction,
    page_size: usize,
    rejection: Option<&Rejection>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Instruction: {}", instruction.text);
    if let Some(rejection) = rejection {
        let _ = writeln!(out, "Invalid action: {rejection}");
    }
    out.push('\n');

    let product = state.product.as_ref().and_then(|id| catalog.get(id));

    match (state.page, product) {
        (PageKind::Search, _) => {
            out.push_str("[Search]\n");
        }
        (PageKind::Results, _) => render_results(&mut out, state, catalog, page_size),
        (PageKind::Item, Some(product)) => render_item(&mut out, state, product),
        (PageKind::ItemSubPage, Some(product)) => {
            render_sub_page(&mut out, product, state.sub_page.unwrap_or(SubPage::Description))
        }
        (PageKind::Done, _) => render_done(&mut out, state),
        (PageKind::Item | PageKind::ItemSubPage, None) => {
            out.push_str("[< Back]\n");
        }
    }

    out
}

fn render_results(out: &mut String, state: &SessionState, catalog: &Catalog, page_size: usize) {
    let query = state.last_query.as_deref().unwrap_or_default();
    let _ = writeln!(
        out,
        "Results for '{query}' (page {} of {}, {} total)",
        state.results_page + 1,
        state.num_results_pages(page_size),
        state.results.len()
    );
    if state.results.is_empty() {
        out.push_str("No products found.\n");
    }
    for hit in state.page_hits(page_size) {
        if let Some(p) = catalog.get(&hit.id) {
            let _ = writeln!(out, "[{}] {} - ${:.2}", p.id, p.title, p.price);
        }
    }
    if state.results_page > 0 {
        out.push_str("[< Prev] ");
    }
    if state.has_next_page(page_size) {
        out.push_str("[Next >]");
    }
    out.push('\n');
}

fn render_item(out: &mut String, state: &SessionState, product: &Product) {
    let _ = writeln!(out, "{}", product.title);
    let _ = writeln!(out, "Price: ${:.2}", product.price);
    for (dimension, values) in &product.options {
        let chosen = state.selected.get(dimension);
        let rendered: Vec<String> = values
            .iter()
            .map(|v| {
                if chosen == Some(v) {
                    format!("[*{v}]")
                } else {
                    format!("[{v}]")
                }
            })
            .collect();
        let _ = writeln!(out, "{dimension}: {}", rendered.join(" "));
    }
    let labels: Vec<String> = SubPage::ALL.iter().map(|p| format!("[{}]", p.as_str())).collect();
    let _ = writeln!(out, "{}", labels.join(" "));
    out.push_str("[Buy Now] [< Back]\n");
}

fn render_sub_page(out: &mut String, product: &Product, page: SubPage) {
    let _ = writeln!(out, "{} - {}", product.title, page.as_str());
    match page {
        SubPage::Description => {
            let _ = writeln!(out, "{}", product.description);
        }
        SubPage::Features => {
            if product.features.is_empty() {
                out.push_str("No features listed.\n");
            }
            for feature in &product.features {
                let _ = writeln!(out, "- {feature}");
            }
        }
        SubPage::Reviews => {
            if product.reviews.is_empty() {
                out.push_str("No reviews yet.\n");
            }
            for review in &product.reviews {
                let _ = writeln!(out, "{}/5: {}", review.rating, review.text);
            }
        }
        SubPage::Attributes => {
            for attribute in &product.attributes {
                let _ = writeln!(out, "- {attribute}");
            }
        }
    }
    out.push_str("[< Back]\n");
}

fn render_done(out: &mut String, state: &SessionState) {
    out.push_str("Thank you for shopping with us!\n");
    if let Some(purchase) = &state.purchase {
        let _ = writeln!(out, "Purchased: {}", purchase.product);
        for (dimension, value) in &purchase.options {
            let _ = writeln!(out, "{dimension}: {value}");
        }
    }
    if let Some(score) = &state.score {
        let _ = writeln!(out, "Reward: {:.3}", score.reward);
    }
}
