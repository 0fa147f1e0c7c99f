//! Declarative machine definitions.
//!
//! A `MachineDefinition` is a flat map of state id to `StateSpec`. Guards,
//! actions and services are referenced by name only; a `Registry` resolves
//! them into an executable `Machine` once, at load time.

use super::event::EventKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a state ends stepping for the turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    #[default]
    Normal,
    Final,
}

/// Metadata attached to a state for the renderer and disposal policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tag {
    Error,
    Resolved,
    Invoked,
    EncryptInput,
}

/// One candidate edge: target, optional guard, ordered actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub target: String,
    #[serde(default)]
    pub guard: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Async side effect bound to a state, with outcome routing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvokeSpec {
    pub service: String,
    #[serde(default)]
    pub on_done: Vec<TransitionSpec>,
    #[serde(default)]
    pub on_error: Vec<TransitionSpec>,
}

/// Synthetic event raised unconditionally on entering a state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Raise {
    pub kind: EventKind,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// One state of a machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSpec {
    #[serde(default)]
    pub kind: StateKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub raise: Option<Raise>,
    #[serde(default)]
    pub invoke: Option<InvokeSpec>,
    /// Ordered candidates per event kind. Declaration order is evaluation order.
    #[serde(default)]
    pub on: BTreeMap<EventKind, Vec<TransitionSpec>>,
}

impl StateSpec {
    pub fn is_final(&self) -> bool {
        self.kind == StateKind::Final
    }

    pub fn is_error(&self) -> bool {
        self.has_tag(Tag::Error)
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    /// Candidates registered for an event kind, in declaration order.
    pub fn candidates(&self, kind: EventKind) -> &[TransitionSpec] {
        self.on.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every outgoing candidate, including invocation routes.
    pub fn all_transitions(&self) -> impl Iterator<Item = &TransitionSpec> {
        let routes = self
            .invoke
            .iter()
            .flat_map(|invoke| invoke.on_done.iter().chain(invoke.on_error.iter()));
        self.on.values().flatten().chain(routes)
    }
}

/// Static, immutable description of one feature's state graph.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::MachineDefinition;
///
/// let json = r#"{
///     "id": "demo",
///     "initial": "menu",
///     "states": {
///         "menu": { "on": { "TRANSIT": [{ "target": "exit", "guard": "isOption9" }] } },
///         "exit": { "kind": "final" }
///     }
/// }"#;
///
/// let definition: MachineDefinition = serde_json::from_str(json).unwrap();
/// assert!(definition.state("exit").unwrap().is_final());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDefinition {
    pub id: String,
    pub initial: String,
    pub states: BTreeMap<String, StateSpec>,
}

impl MachineDefinition {
    pub fn state(&self, id: &str) -> Option<&StateSpec> {
        self.states.get(id)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(target: &str, guard: Option<&str>) -> TransitionSpec {
        TransitionSpec {
            target: target.to_string(),
            guard: guard.map(str::to_string),
            actions: Vec::new(),
        }
    }

    #[test]
    fn candidates_preserve_declaration_order() {
        let mut state = StateSpec::default();
        state.on.insert(
            EventKind::Transit,
            vec![spec("a", Some("first")), spec("b", Some("second")), spec("c", None)],
        );

        let targets: Vec<_> = state
            .candidates(EventKind::Transit)
            .iter()
            .map(|t| t.target.as_str())
            .collect();

        assert_eq!(targets, vec!["a", "b", "c"]);
        assert!(state.candidates(EventKind::Back).is_empty());
    }

    #[test]
    fn all_transitions_includes_invocation_routes() {
        let state = StateSpec {
            invoke: Some(InvokeSpec {
                service: "load".to_string(),
                on_done: vec![spec("done", None)],
                on_error: vec![spec("failed", None)],
            }),
            ..StateSpec::default()
        };

        let targets: Vec<_> = state.all_transitions().map(|t| t.target.clone()).collect();
        assert_eq!(targets, vec!["done".to_string(), "failed".to_string()]);
    }

    #[test]
    fn final_and_error_flags() {
        let state = StateSpec {
            kind: StateKind::Final,
            tags: vec![Tag::Error],
            ..StateSpec::default()
        };

        assert!(state.is_final());
        assert!(state.is_error());
        assert!(!state.has_tag(Tag::Resolved));
    }

    #[test]
    fn definition_round_trips_through_json() {
        let mut states = BTreeMap::new();
        let mut menu = StateSpec::default();
        menu.on
            .insert(EventKind::Transit, vec![spec("exit", Some("isOption9"))]);
        states.insert("menu".to_string(), menu);
        states.insert(
            "exit".to_string(),
            StateSpec {
                kind: StateKind::Final,
                ..StateSpec::default()
            },
        );
        let definition = MachineDefinition {
            id: "demo".to_string(),
            initial: "menu".to_string(),
            states,
        };

        let json = serde_json::to_string(&definition).unwrap();
        let decoded = MachineDefinition::from_json(&json).unwrap();

        assert_eq!(definition, decoded);
    }
}
