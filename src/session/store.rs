//! Key-value session storage with per-entry TTL.

use crate::core::MachineContext;
use crate::session::config::Codec;
use crate::session::error::SessionError;
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::RwLock;

/// Storage seam for sessions. Only key-value semantics are required.
#[async_trait]
pub trait SessionStore<C: MachineContext>: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Session<C>>, SessionError>;
    async fn set(&self, session: &Session<C>, ttl: Duration) -> Result<(), SessionError>;
    async fn delete(&self, key: &str) -> Result<(), SessionError>;
}

struct Entry {
    bytes: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// In-process store keeping encoded records, so every read goes through
/// the same codec a remote cache would.
pub struct MemoryStore<C> {
    codec: Codec,
    entries: RwLock<HashMap<String, Entry>>,
    _context: PhantomData<fn() -> C>,
}

impl<C: MachineContext> MemoryStore<C> {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            entries: RwLock::new(HashMap::new()),
            _context: PhantomData,
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<C: MachineContext> Default for MemoryStore<C> {
    fn default() -> Self {
        Self::new(Codec::default())
    }
}

#[async_trait]
impl<C: MachineContext> SessionStore<C> for MemoryStore<C> {
    async fn get(&self, key: &str) -> Result<Option<Session<C>>, SessionError> {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };

        if entry.expires_at <= Utc::now() {
            entries.remove(key);
            return Ok(None);
        }

        Session::decode(self.codec, &entry.bytes).map(Some)
    }

    async fn set(&self, session: &Session<C>, ttl: Duration) -> Result<(), SessionError> {
        let bytes = session.encode(self.codec)?;
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| SessionError::Store(e.to_string()))?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries
            .write()
            .await
            .insert(session.key.clone(), Entry { bytes, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
