//! Effectful execution of session machines using Stillwater 0.11.0.
//!
//! This module is the "imperative shell" around the pure core: it binds
//! definitions to functions, runs service invocations and routes their
//! outcomes back into the state graph.
//!
//! # Key Concepts
//!
//! - **Transitions**: guarded candidates, first true wins
//! - **Services**: factories producing a fresh `BoxedEffect` per invocation
//! - **Classification**: rejected services become guard-testable `Failure`s
//! - **Interpreter**: one originating event in, one resting state out
//!
//! Suspension happens only while a service effect runs. Everything else in
//! a step is synchronous.

mod classify;
mod graph;
mod machine;
mod service;
mod transition;

pub use classify::{CodeClassifier, ErrorClassifier, BLOCKED_CODE, TIMEOUT_CODE, UNEXPECTED_CODE};
pub use graph::{CompiledState, Invocation, Machine};
pub use machine::{Disposition, Interpreter, StepOutcome};
pub use service::{service_fn, with_timeout, Service, ServiceError};
pub use transition::{select, Transition};
