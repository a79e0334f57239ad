//! Interaction session
//!
//! The [`InteractionController`] owns the visible listening state, drives the
//! capability bridge, classifies finalized transcripts, and dispatches the
//! resulting intents. UI output is a stream of [`UiEvent`]s so the whole
//! state machine runs and tests without a host environment.

mod controller;

pub use controller::{IntentBackend, InteractionController};

use crate::backend::SearchResult;

/// Visible listening state, owned exclusively by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    /// No recognition session active
    Idle,
    /// A recognition session is active
    Listening,
}

/// Display-only projection of the latest order
///
/// Overwritten by each new order; auto-hidden after a fixed delay but never
/// deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Ordered dish, when extracted
    pub dish: Option<String>,
    /// Place the order targets, when known
    pub place: Option<String>,
    /// Requested time of day as `HH:MM`
    pub time: Option<String>,
}

/// UI-facing output of the controller
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Listening indicator turned on or off
    ListeningChanged(bool),
    /// Visible transcript text replaced
    TranscriptUpdated(String),
    /// Session ended without ever showing text; restore the prompt
    PlaceholderRestored,
    /// Loading indicator for an in-flight backend call
    LoadingChanged(bool),
    /// Search results to render (at most three)
    ResultsRendered(Vec<SearchResult>),
    /// Transient user-visible message (errors, "nothing found")
    Banner(String),
    /// Order summary to display
    SummaryShown(Summary),
    /// Order summary display expired
    SummaryHidden,
}
