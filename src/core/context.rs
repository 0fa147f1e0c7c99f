//! The session-scoped payload trait.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for session contexts driven by the interpreter.
///
/// Contexts are persisted between requests, so they must serialize. They are
/// changed only by named actions; guards only ever see a shared reference.
///
/// The feedback tag is transient: the interpreter clears it when an external
/// event selects a transition and sets it when an entry raise fires.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::MachineContext;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// struct Ctx {
///     feedback: Option<String>,
/// }
///
/// impl MachineContext for Ctx {
///     fn feedback(&self) -> Option<&str> {
///         self.feedback.as_deref()
///     }
///
///     fn set_feedback(&mut self, feedback: Option<String>) {
///         self.feedback = feedback;
///     }
/// }
/// ```
pub trait MachineContext:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    fn feedback(&self) -> Option<&str>;

    fn set_feedback(&mut self, feedback: Option<String>);

    /// Display value for a `{name}` template placeholder, if the context has one.
    fn placeholder(&self, _name: &str) -> Option<String> {
        None
    }
}
