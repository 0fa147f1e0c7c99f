//! Build errors for machine definitions and registry resolution.

use crate::validation::DefinitionViolation;
use thiserror::Error;

/// Errors that can occur when building or resolving a machine.
///
/// These are configuration errors: they surface before any session is
/// processed, never while stepping.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified for machine '{machine}'. Call .initial(state) before .build()")]
    MissingInitialState { machine: String },

    #[error("State '{state}' is declared more than once in machine '{machine}'")]
    DuplicateState { machine: String, state: String },

    #[error("Transition target not specified. Call .to(state)")]
    MissingTarget,

    #[error("Machine '{machine}' is invalid: {}", describe(.violations))]
    InvalidDefinition {
        machine: String,
        violations: Vec<DefinitionViolation>,
    },
}

impl BuildError {
    /// All accumulated violations, empty for the other variants.
    pub fn violations(&self) -> &[DefinitionViolation] {
        match self {
            Self::InvalidDefinition { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn describe(violations: &[DefinitionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
