//! Session persistence and per-request orchestration.
//!
//! The transport is stateless, so every keystroke reloads the session,
//! advances it by one step and writes it back (or deletes it once a
//! terminal state is reached). This module provides the persisted record,
//! the storage seam and the orchestrator that ties them to interpreters.

use crate::core::MachineContext;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod store;

pub use config::{Codec, SessionConfig};
pub use error::SessionError;
pub use orchestrator::{Orchestrator, Turn};
pub use store::{MemoryStore, SessionStore};

/// Version identifier for the session record format
pub const SESSION_VERSION: u32 = 1;

/// Persisted conversation state between two requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Session<C: MachineContext> {
    /// Record format version
    pub version: u32,

    /// Unique id of this conversation
    pub id: Uuid,

    /// Storage key
    pub key: String,

    pub machine_id: String,

    pub state_id: String,

    pub context: C,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Lifetime granted by the last write
    pub ttl_secs: u64,
}

impl<C: MachineContext> Session<C> {
    /// Fresh session at `state_id`.
    pub fn new(
        key: impl Into<String>,
        machine_id: impl Into<String>,
        state_id: impl Into<String>,
        context: C,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            version: SESSION_VERSION,
            id: Uuid::new_v4(),
            key: key.into(),
            machine_id: machine_id.into(),
            state_id: state_id.into(),
            context,
            created_at: now,
            updated_at: now,
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Copy carrying a new position and a refreshed lifetime.
    pub fn advanced(&self, state_id: impl Into<String>, context: C, ttl: Duration) -> Self {
        Self {
            state_id: state_id.into(),
            context,
            updated_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
            ..self.clone()
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|ttl| self.updated_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let session: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::DeserializationFailed(e.to_string()))?;
        session.check_version()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SessionError> {
        bincode::serialize(self).map_err(|e| SessionError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SessionError> {
        let session: Self = bincode::deserialize(bytes)
            .map_err(|e| SessionError::DeserializationFailed(e.to_string()))?;
        session.check_version()
    }

    pub fn encode(&self, codec: Codec) -> Result<Vec<u8>, SessionError> {
        match codec {
            Codec::Json => self.to_json().map(String::into_bytes),
            Codec::Bincode => self.to_bytes(),
        }
    }

    pub fn decode(codec: Codec, bytes: &[u8]) -> Result<Self, SessionError> {
        match codec {
            Codec::Json => {
                let json = std::str::from_utf8(bytes)
                    .map_err(|e| SessionError::DeserializationFailed(e.to_string()))?;
                Self::from_json(json)
            }
            Codec::Bincode => Self::from_bytes(bytes),
        }
    }

    fn check_version(self) -> Result<Self, SessionError> {
        if self.version != SESSION_VERSION {
            return Err(SessionError::UnsupportedVersion {
                found: self.version,
                supported: SESSION_VERSION,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataValue;
    use std::collections::BTreeMap;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Ctx {
        feedback: Option<String>,
        data: BTreeMap<String, DataValue>,
    }

    impl MachineContext for Ctx {
        fn feedback(&self) -> Option<&str> {
            self.feedback.as_deref()
        }

        fn set_feedback(&mut self, feedback: Option<String>) {
            self.feedback = feedback;
        }
    }

    fn session() -> Session<Ctx> {
        let mut data = BTreeMap::new();
        data.insert(
            "personal_information".to_string(),
            DataValue::Map(BTreeMap::from([
                ("given_names".to_string(), DataValue::from("John")),
                ("year_of_birth".to_string(), DataValue::Int(1990)),
            ])),
        );
        Session::new(
            "ussd:session:1",
            "profile",
            "enteringFamilyName",
            Ctx {
                feedback: Some("invalidName".to_string()),
                data,
            },
            Duration::from_secs(180),
        )
    }

    #[test]
    fn json_round_trip_preserves_record() {
        let original = session();
        let restored = Session::<Ctx>::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn bincode_round_trip_preserves_record() {
        let original = session();
        let restored = Session::<Ctx>::from_bytes(&original.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn newer_versions_are_rejected() {
        let mut record = session();
        record.version = SESSION_VERSION + 1;

        let err = Session::<Ctx>::from_json(&record.to_json().unwrap()).unwrap_err();
        assert_eq!(
            err,
            SessionError::UnsupportedVersion {
                found: SESSION_VERSION + 1,
                supported: SESSION_VERSION
            }
        );
    }

    #[test]
    fn advancing_keeps_identity() {
        let original = session();
        let next = original.advanced("selectingGender", Ctx::default(), Duration::from_secs(60));

        assert_eq!(next.id, original.id);
        assert_eq!(next.created_at, original.created_at);
        assert_eq!(next.state_id, "selectingGender");
        assert_eq!(next.ttl_secs, 60);
        assert!(next.updated_at >= original.updated_at);
    }

    #[test]
    fn garbage_is_a_deserialization_error() {
        let err = Session::<Ctx>::decode(Codec::Json, b"not json").unwrap_err();
        assert!(matches!(err, SessionError::DeserializationFailed(_)));
    }
}
