//! Builder API for machine definitions and their bindings.
//!
//! Definitions are assembled with fluent builders (or deserialized), then
//! resolved against a `Registry` of named guards, actions and services.
//! Both steps report configuration problems as `BuildError` before any
//! session is processed.

pub mod error;
pub mod machine;
pub mod macros;
pub mod registry;
pub mod state;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use registry::Registry;
pub use state::{InvokeBuilder, StateBuilder};
pub use transition::{target, TransitionBuilder};
