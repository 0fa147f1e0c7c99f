//! Core session state-machine types.
//!
//! This module contains the pure part of the engine:
//! - Declarative machine definitions (`MachineDefinition`, `StateSpec`)
//! - Step inputs and invocation outcomes (`Event`, `Outcome`, `Failure`)
//! - Guard predicates and context actions
//! - The `MachineContext` trait and free-form `DataValue` payloads
//! - Per-turn hop tracking
//!
//! Nothing in this module performs I/O.

mod context;
mod event;
mod guard;
mod history;
mod state;
mod value;

pub use context::MachineContext;
pub use event::{Event, EventKind, Failure, Outcome};
pub use guard::{Action, Guard};
pub use history::{Hop, StepTrace, Trigger};
pub use state::{InvokeSpec, MachineDefinition, Raise, StateKind, StateSpec, Tag, TransitionSpec};
pub use value::DataValue;
