//! Resolved candidate transitions.

use crate::core::{Action, Event, Guard};

/// A candidate edge with its guard and actions bound to functions.
pub struct Transition<C> {
    pub target: String,
    pub guard: Option<Guard<C>>,
    pub actions: Vec<Action<C>>,
}

impl<C> Transition<C> {
    /// Check if this candidate is eligible (pure). No guard means always.
    pub fn can_execute(&self, context: &C, event: &Event) -> bool {
        self.guard
            .as_ref()
            .is_none_or(|g| g.check(context, event))
    }

    /// Run the actions in declaration order.
    pub fn apply(&self, context: C, event: &Event) -> C {
        self.actions
            .iter()
            .fold(context, |context, action| action.apply(context, event))
    }

    pub fn guard_name(&self) -> Option<&str> {
        self.guard.as_ref().map(Guard::name)
    }
}

impl<C> Clone for Transition<C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            guard: self.guard.clone(),
            actions: self.actions.clone(),
        }
    }
}

/// First candidate whose guard passes, in declaration order.
pub fn select<'a, C>(
    candidates: &'a [Transition<C>],
    context: &C,
    event: &Event,
) -> Option<&'a Transition<C>> {
    candidates.iter().find(|t| t.can_execute(context, event))
}
