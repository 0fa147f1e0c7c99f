//! Step inputs and the tagged outcome of a service invocation.

use super::value::DataValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a step input. Transition tables are keyed by this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A keystroke moving the session forward.
    Transit,
    /// A keystroke asking for the previous menu.
    Back,
    /// Raised internally when an invalid-entry state re-prompts.
    Retry,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transit => "TRANSIT",
            Self::Back => "BACK",
            Self::Retry => "RETRY",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service failure after classification, in a shape guards can test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    /// Stable kind code, e.g. `CHANGE_ERROR`.
    pub code: String,
    /// Whether the failure means the account is blocked.
    pub blocked: bool,
    /// Human readable detail, kept for error messages.
    pub detail: String,
}

/// Result of a service invocation as seen by `onDone`/`onError` guards.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success(DataValue),
    Failure(Failure),
}

/// One step input. Immutable once constructed.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::{Event, EventKind};
///
/// let event = Event::transit("1");
/// assert_eq!(event.kind(), EventKind::Transit);
/// assert_eq!(event.input(), "1");
/// assert!(event.outcome().is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    kind: EventKind,
    input: String,
    feedback: Option<String>,
    outcome: Option<Outcome>,
}

impl Event {
    pub fn new(kind: EventKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
            feedback: None,
            outcome: None,
        }
    }

    pub fn transit(input: impl Into<String>) -> Self {
        Self::new(EventKind::Transit, input)
    }

    pub fn back(input: impl Into<String>) -> Self {
        Self::new(EventKind::Back, input)
    }

    /// Synthetic event produced by an entry raise.
    pub(crate) fn raised(kind: EventKind, input: &str, feedback: Option<String>) -> Self {
        Self {
            kind,
            input: input.to_string(),
            feedback,
            outcome: None,
        }
    }

    /// Copy of this event carrying an invocation outcome.
    pub(crate) fn with_outcome(&self, outcome: Outcome) -> Self {
        Self {
            kind: self.kind,
            input: self.input.clone(),
            feedback: self.feedback.clone(),
            outcome: Some(outcome),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// The service output, when this event resolves a successful invocation.
    pub fn output(&self) -> Option<&DataValue> {
        match &self.outcome {
            Some(Outcome::Success(value)) => Some(value),
            _ => None,
        }
    }

    /// The classified failure, when this event resolves a rejected invocation.
    pub fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Some(Outcome::Failure(failure)) => Some(failure),
            _ => None,
        }
    }
}
