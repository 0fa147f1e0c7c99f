//! Per-turn hop tracking.
//!
//! A single keystroke may move a session through several states: the
//! selected transition, any entry raises, and any invocation resolutions.
//! `StepTrace` records each hop immutably, in order.

use super::event::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused a hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// The external event of the turn.
    Event(EventKind),
    /// An entry raise fired by the state being left.
    Raise(EventKind),
    /// A service invocation resolved successfully.
    Done,
    /// A service invocation was rejected.
    Error,
}

/// Record of a single hop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub trigger: Trigger,
    pub timestamp: DateTime<Utc>,
}

/// Ordered hops taken while processing one originating event.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::{EventKind, Hop, StepTrace, Trigger};
/// use chrono::Utc;
///
/// let trace = StepTrace::new()
///     .record(Hop {
///         from: "firstLanguageSet".to_string(),
///         to: "invalidLanguageOption".to_string(),
///         trigger: Trigger::Event(EventKind::Transit),
///         timestamp: Utc::now(),
///     })
///     .record(Hop {
///         from: "invalidLanguageOption".to_string(),
///         to: "firstLanguageSet".to_string(),
///         trigger: Trigger::Raise(EventKind::Retry),
///         timestamp: Utc::now(),
///     });
///
/// assert_eq!(
///     trace.path(),
///     vec!["firstLanguageSet", "invalidLanguageOption", "firstLanguageSet"]
/// );
/// assert_eq!(trace.raises(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTrace {
    hops: Vec<Hop>,
}

impl StepTrace {
    pub fn new() -> Self {
        Self { hops: Vec::new() }
    }

    /// Record a hop, returning a new trace.
    pub fn record(&self, hop: Hop) -> Self {
        let mut hops = self.hops.clone();
        hops.push(hop);
        Self { hops }
    }

    /// States traversed: the origin, then the `to` of every hop.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.hops.first() {
            path.push(first.from.as_str());
        }
        for hop in &self.hops {
            path.push(hop.to.as_str());
        }
        path
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Number of entry raises that fired.
    pub fn raises(&self) -> usize {
        self.hops
            .iter()
            .filter(|h| matches!(h.trigger, Trigger::Raise(_)))
            .count()
    }

    /// Number of service invocations that resolved into a hop.
    pub fn invocations(&self) -> usize {
        self.hops
            .iter()
            .filter(|h| matches!(h.trigger, Trigger::Done | Trigger::Error))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(from: &str, to: &str, trigger: Trigger) -> Hop {
        Hop {
            from: from.to_string(),
            to: to.to_string(),
            trigger,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_trace_is_empty() {
        let trace = StepTrace::new();
        assert!(trace.is_empty());
        assert!(trace.path().is_empty());
        assert_eq!(trace.invocations(), 0);
    }

    #[test]
    fn record_is_immutable() {
        let trace = StepTrace::new();
        let recorded = trace.record(hop("a", "b", Trigger::Event(EventKind::Transit)));

        assert!(trace.is_empty());
        assert_eq!(recorded.hops().len(), 1);
    }

    #[test]
    fn counts_raises_and_invocations() {
        let trace = StepTrace::new()
            .record(hop("pin", "authorizing", Trigger::Event(EventKind::Transit)))
            .record(hop("authorizing", "invalidPin", Trigger::Error))
            .record(hop("invalidPin", "pin", Trigger::Raise(EventKind::Retry)));

        assert_eq!(trace.path(), vec!["pin", "authorizing", "invalidPin", "pin"]);
        assert_eq!(trace.invocations(), 1);
        assert_eq!(trace.raises(), 1);
    }

    #[test]
    fn trace_serializes() {
        let trace = StepTrace::new().record(hop("a", "b", Trigger::Done));
        let json = serde_json::to_string(&trace).unwrap();
        let decoded: StepTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(trace, decoded);
    }
}
