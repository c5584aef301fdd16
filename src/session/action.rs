//! Typed agent actions and their WebShop-style text form.
//!
//! | Action | Text |
//! |---|---|
//! | submit-query | `search[<query>]` |
//! | search-again | `search_again[<query>]` (or `search[..]` on a results page) |
//! | click-product | `click[<product id>]` |
//! | next / prev page | `click[next >]`, `click[< prev]` |
//! | select-option | `select[<dimension>: <value>]` |
//! | view-sub-page | `click[description]`, `click[features]`, `click[reviews]`, `click[attributes]` |
//! | click-buy | `click[buy now]` |
//! | back | `click[< back]` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ProductId;

/// Secondary pages reachable from an item page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubPage {
    Description,
    Features,
    Reviews,
    Attributes,
}

impl SubPage {
    pub const ALL: [SubPage; 4] = [
        SubPage::Description,
        SubPage::Features,
        SubPage::Reviews,
        SubPage::Attributes,
    ];

    /// Human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "Description",
            Self::Features => "Features",
            Self::Reviews => "Reviews",
            Self::Attributes => "Attributes",
        }
    }

    /// Parse from a string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "description" | "desc" => Some(Self::Description),
            "features" | "feature" => Some(Self::Features),
            "reviews" | "review" => Some(Self::Reviews),
            "attributes" | "attribute" => Some(Self::Attributes),
            _ => None,
        }
    }
}

/// An action the agent can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SubmitQuery { query: String },
    SearchAgain { query: String },
    ClickProduct { id: ProductId },
    NextPage,
    PrevPage,
    SelectOption { dimension: String, value: String },
    ViewSubPage { page: SubPage },
    ClickBuy,
    Back,
}

/// Payload-free tag of an [`Action`], used by the legality table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SubmitQuery,
    SearchAgain,
    ClickProduct,
    NextPage,
    PrevPage,
    SelectOption,
    ViewSubPage,
    ClickBuy,
    Back,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SubmitQuery => "submit-query",
            Self::SearchAgain => "search-again",
            Self::ClickProduct => "click-product",
            Self::NextPage => "next-page",
            Self::PrevPage => "prev-page",
            Self::SelectOption => "select-option",
            Self::ViewSubPage => "view-sub-page",
            Self::ClickBuy => "click-buy",
            Self::Back => "back",
        };
        f.write_str(s)
    }
}

impl Action {
    pub fn submit_query(query: impl Into<String>) -> Self {
        Self::SubmitQuery {
            query: query.into(),
        }
    }

    pub fn search_again(query: impl Into<String>) -> Self {
        Self::SearchAgain {
            query: query.into(),
        }
    }

    pub fn click_product(id: impl Into<ProductId>) -> Self {
        Self::ClickProduct { id: id.into() }
    }

    pub fn select_option(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SelectOption {
            dimension: dimension.into(),
            value: value.into(),
        }
    }

    pub fn view_sub_page(page: SubPage) -> Self {
        Self::ViewSubPage { page }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SubmitQuery { .. } => ActionKind::SubmitQuery,
            Self::SearchAgain { .. } => ActionKind::SearchAgain,
            Self::ClickProduct { .. } => ActionKind::ClickProduct,
            Self::NextPage => ActionKind::NextPage,
            Self::PrevPage => ActionKind::PrevPage,
            Self::SelectOption { .. } => ActionKind::SelectOption,
            Self::ViewSubPage { .. } => ActionKind::ViewSubPage,
            Self::ClickBuy => ActionKind::ClickBuy,
            Self::Back => ActionKind::Back,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitQuery { query } => write!(f, "search[{query}]"),
            Self::SearchAgain { query } => write!(f, "search_again[{query}]"),
            Self::ClickProduct { id } => write!(f, "click[{id}]"),
            Self::NextPage => f.write_str("click[next >]"),
            Self::PrevPage => f.write_str("click[< prev]"),
            Self::SelectOption { dimension, value } => write!(f, "select[{dimension}: {value}]"),
            Self::ViewSubPage { page } => write!(f, "click[{}]", page.as_str().to_lowercase()),
            Self::ClickBuy => f.write_str("click[buy now]"),
            Self::Back => f.write_str("click[< back]"),
        }
    }
}

/// Failure to parse a text action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseActionError {
    #[error("expected `verb[argument]`, got '{0}'")]
    Malformed(String),

    #[error("unknown action verb '{0}'")]
    UnknownVerb(String),

    #[error("select needs `dimension: value`, got '{0}'")]
    MissingSeparator(String),

    #[error("{0} needs a non-empty argument")]
    EmptyArgument(&'static str),
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let open = s
            .find('[')
            .ok_or_else(|| ParseActionError::Malformed(s.to_string()))?;
        if !s.ends_with(']') {
            return Err(ParseActionError::Malformed(s.to_string()));
        }
        let verb = s[..open].trim().to_lowercase();
        let arg = s[open + 1..s.len() - 1].trim();

        match verb.as_str() {
            "search" => Ok(Action::submit_query(arg)),
            "search_again" => Ok(Action::search_again(arg)),
            "select" => {
                let (dimension, value) = arg
                    .split_once(':')
                    .ok_or_else(|| ParseActionError::MissingSeparator(arg.to_string()))?;
                let (dimension, value) = (dimension.trim(), value.trim());
                if dimension.is_empty() || value.is_empty() {
                    return Err(ParseActionError::MissingSeparator(arg.to_string()));
                }
                Ok(Action::select_option(dimension, value))
            }
            "click" => {
                if arg.is_empty() {
                    return Err(ParseActionError::EmptyArgument("click"));
                }
                let lowered = arg.to_lowercase();
                let action = match lowered.as_str() {
                    "next >" | "next" | "next page" => Action::NextPage,
                    "< prev" | "prev" | "previous" | "prev page" => Action::PrevPage,
                    "< back" | "back" => Action::Back,
                    "buy now" | "buy" => Action::ClickBuy,
                    other => match SubPage::from_str_loose(other) {
                        Some(page) => Action::view_sub_page(page),
                        None => Action::click_product(arg),
                    },
                };
                Ok(action)
            }
            other => Err(ParseActionError::UnknownVerb(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        assert_eq!(
            "search[red shirt]".parse::<Action>().unwrap(),
            Action::submit_query("red shirt")
        );
        assert_eq!("search[]".parse::<Action>().unwrap(), Action::submit_query(""));
    }

    #[test]
    fn test_parse_clicks() {
        assert_eq!("click[B00X1]".parse::<Action>().unwrap(), Action::click_product("B00X1"));
        assert_eq!("click[Next >]".parse::<Action>().unwrap(), Action::NextPage);
        assert_eq!("click[< Prev]".parse::<Action>().unwrap(), Action::PrevPage);
        assert_eq!("click[Buy Now]".parse::<Action>().unwrap(), Action::ClickBuy);
        assert_eq!("click[< Back]".parse::<Action>().unwrap(), Action::Back);
        assert_eq!(
            "click[Reviews]".parse::<Action>().unwrap(),
            Action::view_sub_page(SubPage::Reviews)
        );
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            "select[size: M]".parse::<Action>().unwrap(),
            Action::select_option("size", "M")
        );
        assert!(matches!(
            "select[size]".parse::<Action>(),
            Err(ParseActionError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "buy_now".parse::<Action>(),
            Err(ParseActionError::Malformed(_))
        ));
        assert!(matches!(
            "jump[now]".parse::<Action>(),
            Err(ParseActionError::UnknownVerb(v)) if v == "jump"
        ));
        assert_eq!(
            "click[]".parse::<Action>(),
            Err(ParseActionError::EmptyArgument("click"))
        );
    }

    #[test]
    fn test_display_parses_back() {
        let actions = [
            Action::submit_query("wool socks"),
            Action::search_again("cotton socks"),
            Action::click_product("B07"),
            Action::NextPage,
            Action::PrevPage,
            Action::select_option("color", "navy blue"),
            Action::view_sub_page(SubPage::Features),
            Action::ClickBuy,
            Action::Back,
        ];
        for action in actions {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
    }
}
