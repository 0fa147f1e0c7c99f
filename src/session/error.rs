//! Session persistence error types.

use thiserror::Error;

/// Errors raised while loading, storing or advancing a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Encoding a session record failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Decoding a session record failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Record was written by an incompatible version
    #[error("Unsupported session version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Record names a machine that is not registered
    #[error("Unknown machine '{0}'")]
    UnknownMachine(String),

    /// Storage backend failure
    #[error("Session store failure: {0}")]
    Store(String),
}
