//! Guard predicates and context actions.
//!
//! Guards are pure boolean functions over `(context, event)` that decide
//! whether a candidate transition is eligible. Actions are pure functions
//! that take a context by value and return the updated one. Neither may
//! perform I/O.

use super::event::Event;
use std::fmt;
use std::sync::Arc;

type Predicate<C> = Arc<dyn Fn(&C, &Event) -> bool + Send + Sync>;
type Update<C> = Arc<dyn Fn(C, &Event) -> C + Send + Sync>;

/// Named, pure predicate that determines if a transition can execute.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::{Event, Guard};
///
/// let is_option_9 = Guard::new("isOption9", |_: &(), event: &Event| event.input() == "9");
///
/// assert!(is_option_9.check(&(), &Event::transit("9")));
/// assert!(!is_option_9.check(&(), &Event::transit("1")));
/// ```
pub struct Guard<C> {
    name: String,
    predicate: Predicate<C>,
}

impl<C> Guard<C> {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C, &Event) -> bool + Send + Sync + 'static,
    {
        Guard {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate. Never mutates the context.
    pub fn check(&self, context: &C, event: &Event) -> bool {
        (self.predicate)(context, event)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}

/// Named, pure context update run when a transition is taken.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::{Action, Event};
///
/// let remember = Action::new("remember", |mut seen: Vec<String>, event: &Event| {
///     seen.push(event.input().to_string());
///     seen
/// });
///
/// let seen = remember.apply(Vec::new(), &Event::transit("John"));
/// assert_eq!(seen, vec!["John".to_string()]);
/// ```
pub struct Action<C> {
    name: String,
    update: Update<C>,
}

impl<C> Action<C> {
    pub fn new<F>(name: impl Into<String>, update: F) -> Self
    where
        F: Fn(C, &Event) -> C + Send + Sync + 'static,
    {
        Action {
            name: name.into(),
            update: Arc::new(update),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, context: C, event: &Event) -> C {
        (self.update)(context, event)
    }
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            update: Arc::clone(&self.update),
        }
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}
