//! Configuration violations found in machine definitions.

use crate::core::EventKind;
use thiserror::Error;

/// A single problem with a machine definition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionViolation {
    #[error("Initial state '{initial}' is not defined")]
    MissingInitial { initial: String },

    #[error("State '{state}' targets unknown state '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("Final state '{state}' declares outgoing transitions")]
    FinalWithTransitions { state: String },

    #[error("Final state '{state}' declares an entry raise or an invocation")]
    FinalWithEffects { state: String },

    #[error("State '{state}' raises {kind} but has no {kind} transition")]
    UnhandledRaise { state: String, kind: EventKind },

    #[error("State '{state}' raises {kind} but every {kind} transition is guarded")]
    RaiseWithoutFallback { state: String, kind: EventKind },

    #[error("State '{state}' declares both an entry raise and an invocation")]
    RaiseAndInvoke { state: String },

    #[error("Invocation of '{service}' in state '{state}' has no onDone route")]
    MissingDoneRoute { state: String, service: String },

    #[error("Invocation of '{service}' in state '{state}' has no onError route")]
    MissingErrorRoute { state: String, service: String },

    #[error("Entry raises and invocations form an unbounded cycle: {}", .cycle.join(" -> "))]
    UnboundedChain { cycle: Vec<String> },

    #[error("State '{state}' uses {what} '{name}' which has no binding")]
    UnresolvedName {
        state: String,
        what: String,
        name: String,
    },
}
