//! Executable machines: definitions with every name bound to a function.

use crate::core::{EventKind, Raise, StateKind, Tag};
use crate::effects::service::Service;
use crate::effects::transition::Transition;
use std::collections::HashMap;

/// A bound service with its outcome routing.
pub struct Invocation<C, Env> {
    pub service_name: String,
    pub service: Service<C, Env>,
    pub on_done: Vec<Transition<C>>,
    pub on_error: Vec<Transition<C>>,
}

/// A state whose guards, actions and service are resolved.
pub struct CompiledState<C, Env> {
    pub id: String,
    pub kind: StateKind,
    pub tags: Vec<Tag>,
    pub raise: Option<Raise>,
    pub invoke: Option<Invocation<C, Env>>,
    pub on: HashMap<EventKind, Vec<Transition<C>>>,
}

impl<C, Env> CompiledState<C, Env> {
    pub fn is_final(&self) -> bool {
        self.kind == StateKind::Final
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn candidates(&self, kind: EventKind) -> &[Transition<C>] {
        self.on.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A validated, resolved state graph. Built by `Registry::resolve`.
pub struct Machine<C, Env> {
    pub(crate) id: String,
    pub(crate) initial: String,
    pub(crate) states: HashMap<String, CompiledState<C, Env>>,
}

impl<C, Env> Machine<C, Env> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn initial(&self) -> &str {
        &self.initial
    }

    pub fn state(&self, id: &str) -> Option<&CompiledState<C, Env>> {
        self.states.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    /// Whether reaching this state disposes the session.
    pub fn is_terminal(&self, id: &str) -> bool {
        self.state(id).is_some_and(CompiledState::is_final)
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
