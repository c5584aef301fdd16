//! Per-episode shopping sessions.
//!
//! - [`action`] -- typed actions and the `verb[argument]` text protocol.
//! - [`state`] -- pages, the legality table, history and session state.
//! - [`observation`] -- what the agent sees after each action.
//! - [`machine`] -- the [`Session`] state machine.

pub mod action;
pub mod machine;
pub mod observation;
pub mod state;

pub use action::{Action, ActionKind, ParseActionError, SubPage};
pub use machine::Session;
pub use observation::Observation;
pub use state::{HistoryEntry, PageKind, Purchase, Rejection, SessionState};
