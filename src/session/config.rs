//! Session configuration.

use crate::session::error::SessionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TTL_SECS: u64 = 180;
pub const DEFAULT_KEY_PREFIX: &str = "ussd:session:";

/// Wire format used for stored session records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Json,
    Bincode,
}

/// Settings for session orchestration.
///
/// # Example
///
/// ```rust
/// use ussd_flow::session::{Codec, SessionConfig};
///
/// let config = SessionConfig::from_json(r#"{ "entry_machine": "languages", "codec": "bincode" }"#).unwrap();
/// assert_eq!(config.ttl_secs, 180);
/// assert_eq!(config.codec, Codec::Bincode);
/// assert_eq!(config.key_for("abc"), "ussd:session:abc");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Machine that fresh sessions start in.
    pub entry_machine: String,
    /// Lifetime of a stored session, refreshed on every write.
    pub ttl_secs: u64,
    pub key_prefix: String,
    pub codec: Codec,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            entry_machine: String::new(),
            ttl_secs: DEFAULT_TTL_SECS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            codec: Codec::Json,
        }
    }
}

impl SessionConfig {
    pub fn new(entry_machine: impl Into<String>) -> Self {
        Self {
            entry_machine: entry_machine.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(|e| SessionError::DeserializationFailed(e.to_string()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Storage key for a transport session id.
    pub fn key_for(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}
