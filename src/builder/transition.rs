//! Builder for candidate transitions.

use crate::builder::error::BuildError;
use crate::core::TransitionSpec;

/// Builder for constructing a candidate transition with a fluent API.
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    target: Option<String>,
    guard: Option<String>,
    actions: Vec<String>,
}

impl TransitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.target = Some(state.into());
        self
    }

    /// Name the guard that must pass (optional).
    pub fn when(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    /// Append a named action. Actions run in the order they are added.
    pub fn act(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn build(self) -> Result<TransitionSpec, BuildError> {
        let target = self.target.ok_or(BuildError::MissingTarget)?;

        Ok(TransitionSpec {
            target,
            guard: self.guard,
            actions: self.actions,
        })
    }
}

/// Start a transition to `state`.
///
/// # Example
///
/// ```
/// use ussd_flow::builder::target;
///
/// let spec = target("enteringPin")
///     .when("isValidLanguageOption")
///     .act("saveLanguageSelection")
///     .build()
///     .unwrap();
///
/// assert_eq!(spec.target, "enteringPin");
/// assert_eq!(spec.guard.as_deref(), Some("isValidLanguageOption"));
/// ```
pub fn target(state: impl Into<String>) -> TransitionBuilder {
    TransitionBuilder::new().to(state)
}
