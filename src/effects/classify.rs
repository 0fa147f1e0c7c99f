//! Turns a rejected invocation into a guard-testable `Failure`.
//!
//! Classification performs no recovery. It only extracts a stable kind code
//! and the account-blocked flag so `onError` guards can match on them.

use crate::core::Failure;
use crate::effects::service::ServiceError;

pub const BLOCKED_CODE: &str = "ACCOUNT_BLOCKED";
pub const UNEXPECTED_CODE: &str = "UNEXPECTED";
pub const TIMEOUT_CODE: &str = "TIMEOUT";

/// Maps a service error into its classified shape.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &ServiceError) -> Failure;
}

/// Classifier reading the code carried by `ServiceError` itself.
///
/// # Example
///
/// ```rust
/// use ussd_flow::effects::{CodeClassifier, ErrorClassifier, ServiceError};
///
/// let failure = CodeClassifier.classify(&ServiceError::machine("CHANGE_ERROR", "failed"));
/// assert_eq!(failure.code, "CHANGE_ERROR");
/// assert!(!failure.blocked);
///
/// let failure = CodeClassifier.classify(&ServiceError::AccountBlocked);
/// assert!(failure.blocked);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CodeClassifier;

impl ErrorClassifier for CodeClassifier {
    fn classify(&self, error: &ServiceError) -> Failure {
        let (code, blocked) = match error {
            ServiceError::AccountBlocked => (BLOCKED_CODE.to_string(), true),
            ServiceError::Machine { code, .. } => (code.clone(), false),
            ServiceError::Unexpected(_) => (UNEXPECTED_CODE.to_string(), false),
            ServiceError::TimedOut(_) => (TIMEOUT_CODE.to_string(), false),
        };

        Failure {
            code,
            blocked,
            detail: error.to_string(),
        }
    }
}
