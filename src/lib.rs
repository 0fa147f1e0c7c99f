//! ussd-flow: a replay-safe session state-machine interpreter for USSD menus
//!
//! USSD transports are stateless: every request carries one keystroke, so
//! the server reloads the conversation, advances it by exactly one logical
//! step and persists the result before replying. This crate is the engine
//! behind that loop, built on Stillwater's "pure core, imperative shell"
//! philosophy.
//!
//! # Core Concepts
//!
//! - **Definitions**: flat, serializable state graphs with guarded, ordered candidates
//! - **Registry**: binds symbolic guard/action/service names to functions, once
//! - **Interpreter**: first-true-wins selection, entry raises, service invocations
//! - **Classification**: service failures become guard-testable outcomes
//! - **Sessions**: load, step, persist or delete, with TTL
//!
//! # Example
//!
//! ```rust
//! use ussd_flow::builder::{target, MachineBuilder, Registry, StateBuilder};
//! use ussd_flow::core::{Event, EventKind, MachineContext};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Ctx {
//!     feedback: Option<String>,
//! }
//!
//! impl MachineContext for Ctx {
//!     fn feedback(&self) -> Option<&str> {
//!         self.feedback.as_deref()
//!     }
//!
//!     fn set_feedback(&mut self, feedback: Option<String>) {
//!         self.feedback = feedback;
//!     }
//! }
//!
//! let definition = MachineBuilder::new("menu")
//!     .initial("main")
//!     .state(
//!         StateBuilder::new("main")
//!             .transit(target("exit").when("isOption9"))
//!             .transit(target("invalidOption")),
//!     )
//!     .state(
//!         StateBuilder::new("invalidOption")
//!             .raise_retry("invalidOption")
//!             .on(EventKind::Retry, target("main")),
//!     )
//!     .state(StateBuilder::final_state("exit"))
//!     .build()
//!     .unwrap();
//!
//! let registry: Registry<Ctx, ()> =
//!     Registry::new().guard("isOption9", |_: &Ctx, e: &Event| e.input() == "9");
//! let interpreter = registry.interpreter(&definition).unwrap();
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let outcome = runtime.block_on(interpreter.step("main", Ctx::default(), Event::transit("7"), &()));
//!
//! assert_eq!(outcome.state_id, "main");
//! assert_eq!(outcome.context.feedback(), Some("invalidOption"));
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod render;
pub mod session;
pub mod ussd;
pub mod validation;

// Re-export commonly used types
pub use builder::{BuildError, Registry};
pub use core::{DataValue, Event, EventKind, MachineContext, MachineDefinition};
pub use effects::{Disposition, Interpreter, StepOutcome};
pub use session::{Orchestrator, Session, SessionConfig, SessionStore};
