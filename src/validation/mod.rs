//! Validation-based checks for machine definitions.
//!
//! Definitions are checked with Stillwater's `Validation` so that every
//! configuration problem is reported in one pass instead of one at a time:
//! unknown targets, misused final states, unhandled or cyclic entry raises,
//! incomplete invocation routing and unbound guard/action/service names.
//!
//! # Example
//!
//! ```rust
//! use ussd_flow::core::MachineDefinition;
//! use ussd_flow::validation::{check, validate_structure, DefinitionViolation};
//!
//! let json = r#"{
//!     "id": "broken",
//!     "initial": "menu",
//!     "states": { "menu": { "on": { "TRANSIT": [{ "target": "nowhere" }] } } }
//! }"#;
//! let definition = MachineDefinition::from_json(json).unwrap();
//!
//! let violations = check(validate_structure(&definition)).unwrap_err();
//! assert!(matches!(&violations[0], DefinitionViolation::UnknownTarget { target, .. } if target == "nowhere"));
//! ```

pub mod rules;
pub mod violations;

pub use rules::{check, validate, validate_structure, Bindings, Checked};
pub use violations::DefinitionViolation;
