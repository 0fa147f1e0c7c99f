//! Builder for constructing machine definitions.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::core::MachineDefinition;
use crate::validation;
use std::collections::BTreeMap;

/// Builder for constructing machine definitions with a fluent API.
///
/// `build` checks the graph's structure (targets, finals, raises,
/// invocation routes) and reports every violation at once.
///
/// # Example
///
/// ```
/// use ussd_flow::builder::{target, MachineBuilder, StateBuilder};
///
/// let definition = MachineBuilder::new("demo")
///     .initial("menu")
///     .state(StateBuilder::new("menu").transit(target("exit").when("isOption9")))
///     .state(StateBuilder::final_state("exit"))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.initial, "menu");
/// ```
#[derive(Clone, Debug)]
pub struct MachineBuilder {
    id: String,
    initial: Option<String>,
    states: Vec<StateBuilder>,
}

impl MachineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initial: None,
            states: Vec::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    pub fn state(mut self, state: StateBuilder) -> Self {
        self.states.push(state);
        self
    }

    pub fn states(mut self, states: Vec<StateBuilder>) -> Self {
        self.states.extend(states);
        self
    }

    /// Build and structurally validate the definition.
    pub fn build(self) -> Result<MachineDefinition, BuildError> {
        let initial = self.initial.ok_or_else(|| BuildError::MissingInitialState {
            machine: self.id.clone(),
        })?;

        let mut states = BTreeMap::new();
        for builder in self.states {
            let (id, spec) = builder.build()?;
            if states.contains_key(&id) {
                return Err(BuildError::DuplicateState {
                    machine: self.id,
                    state: id,
                });
            }
            states.insert(id, spec);
        }

        let definition = MachineDefinition {
            id: self.id,
            initial,
            states,
        };

        validation::check(validation::validate_structure(&definition)).map_err(|violations| {
            BuildError::InvalidDefinition {
                machine: definition.id.clone(),
                violations,
            }
        })?;

        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::transition::target;
    use crate::validation::DefinitionViolation;

    #[test]
    fn builder_requires_initial_state() {
        let result = MachineBuilder::new("demo")
            .state(StateBuilder::final_state("exit"))
            .build();

        assert!(matches!(result, Err(BuildError::MissingInitialState { .. })));
    }

    #[test]
    fn builder_rejects_duplicate_states() {
        let result = MachineBuilder::new("demo")
            .initial("exit")
            .state(StateBuilder::final_state("exit"))
            .state(StateBuilder::final_state("exit"))
            .build();

        assert!(matches!(result, Err(BuildError::DuplicateState { state, .. }) if state == "exit"));
    }

    #[test]
    fn builder_accumulates_structural_violations() {
        let result = MachineBuilder::new("demo")
            .initial("missing")
            .state(StateBuilder::new("menu").transit(target("nowhere")))
            .build();

        let err = result.unwrap_err();
        let violations = err.violations();
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .any(|v| matches!(v, DefinitionViolation::MissingInitial { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, DefinitionViolation::UnknownTarget { target, .. } if target == "nowhere")));
    }

    #[test]
    fn states_can_be_added_in_bulk() {
        let definition = MachineBuilder::new("demo")
            .initial("menu")
            .states(vec![
                StateBuilder::new("menu").transit(target("exit")),
                StateBuilder::final_state("exit"),
            ])
            .build()
            .unwrap();

        assert_eq!(definition.states.len(), 2);
    }
}
