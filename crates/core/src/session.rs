//! Per-session presentation state.
//!
//! A session moves through `Idle -> Pending -> Resolved`, and back to `Pending` on every new
//! submission. State values are never mutated in place: [`update`] consumes the current state
//! and an event and returns the next state, which keeps the state machine testable without any
//! rendering layer.

/// What a settled submission produced. Exactly one of result or error is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Result(String),
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been submitted yet.
    #[default]
    Idle,
    /// A submission is in flight; any previous outcome has been cleared.
    Pending,
    /// The latest submission settled.
    Resolved(Outcome),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Submitted,
    Completed(String),
    Failed(String),
}

/// Message shown when the model answered with nothing but whitespace.
pub const EMPTY_RESULT_MESSAGE: &str = "The language model returned an empty response.";

/// Apply one event to a session state.
///
/// `Submitted` is accepted from any state and discards the previous outcome. Completion events
/// are only meaningful while `Pending`; anywhere else they leave the state unchanged.
pub fn update(state: SessionState, event: SessionEvent) -> SessionState {
    match (state, event) {
        (_, SessionEvent::Submitted) => SessionState::Pending,
        (SessionState::Pending, SessionEvent::Completed(text)) => {
            if text.trim().is_empty() {
                SessionState::Resolved(Outcome::Error(EMPTY_RESULT_MESSAGE.into()))
            } else {
                SessionState::Resolved(Outcome::Result(text))
            }
        }
        (SessionState::Pending, SessionEvent::Failed(message)) => {
            let message = if message.trim().is_empty() {
                "Something went wrong.".to_string()
            } else {
                message
            };
            SessionState::Resolved(Outcome::Error(message))
        }
        (state, event) => {
            tracing::debug!(?state, ?event, "ignoring event outside of a pending submission");
            state
        }
    }
}

/// Everything a renderer needs to draw a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionView {
    pub result: String,
    /// The same text as `result`, for the secondary output area.
    pub duplicate_result: String,
    pub error: String,
    pub header_visible: bool,
    pub pending: bool,
}

impl SessionState {
    pub fn view(&self) -> SessionView {
        match self {
            SessionState::Idle => SessionView::default(),
            SessionState::Pending => SessionView {
                pending: true,
                ..SessionView::default()
            },
            SessionState::Resolved(Outcome::Result(text)) => SessionView {
                result: text.clone(),
                duplicate_result: text.clone(),
                header_visible: true,
                ..SessionView::default()
            },
            SessionState::Resolved(Outcome::Error(message)) => SessionView {
                error: message.clone(),
                ..SessionView::default()
            },
        }
    }
}
