//! External collaborators the USSD services talk to, and in-memory versions.
//!
//! The durable account store, the profile (identity) service and the
//! account cache are separate backends with no shared transaction.

use crate::ussd::context::PersonalInformation;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

/// Wrong PIN entries allowed before the account is blocked.
pub const MAX_PIN_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Result of checking a PIN against an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinCheck {
    Valid,
    Invalid { remaining: u32 },
    Blocked,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn verify_pin(&self, phone_number: &str, pin: &str) -> Result<PinCheck, StoreError>;
    async fn update_language(&self, phone_number: &str, language: &str) -> Result<(), StoreError>;
    /// Append `ward` to the wards guarded by `guardian`.
    async fn add_guardian(&self, guardian: &str, ward: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn personal_information(&self, address: &str) -> Result<Option<PersonalInformation>, StoreError>;
    async fn upsert_personal_information(
        &self,
        address: &str,
        update: &PersonalInformation,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AccountCache: Send + Sync {
    async fn set_language(&self, phone_number: &str, language: &str) -> Result<(), StoreError>;
    async fn add_guardian(&self, ward: &str, guardian: &str) -> Result<(), StoreError>;
}

/// Environment handed to every USSD service.
#[derive(Clone)]
pub struct Resources {
    pub accounts: Arc<dyn AccountStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub cache: Arc<dyn AccountCache>,
}

impl Resources {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        profiles: Arc<dyn ProfileStore>,
        cache: Arc<dyn AccountCache>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            cache,
        }
    }
}

/// Combine the results of a durable write and a cache write that were
/// awaited together. Either failure fails the whole; a half that already
/// committed stays committed.
pub(crate) fn joint(
    operation: &str,
    durable: Result<(), StoreError>,
    cached: Result<(), StoreError>,
) -> Result<(), StoreError> {
    if durable.is_ok() != cached.is_ok() {
        warn!(
            operation,
            durable = durable.is_ok(),
            cached = cached.is_ok(),
            "joint update partially committed"
        );
    }
    durable.and(cached)
}

/// Switch for simulating an unavailable backend.
#[derive(Debug, Default)]
struct Outage(AtomicBool);

impl Outage {
    fn set(&self, down: bool) {
        self.0.store(down, Ordering::SeqCst);
    }

    fn check(&self, backend: &str) -> Result<(), StoreError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(backend.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct AccountRecord {
    pin: String,
    failed_attempts: u32,
    blocked: bool,
    language: String,
}

#[derive(Debug, Default)]
pub struct MemoryAccounts {
    accounts: RwLock<HashMap<String, AccountRecord>>,
    wards: RwLock<HashMap<String, Vec<String>>>,
    outage: Outage,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, phone_number: &str, pin: &str, language: &str) {
        self.accounts.write().await.insert(
            phone_number.to_string(),
            AccountRecord {
                pin: pin.to_string(),
                failed_attempts: 0,
                blocked: false,
                language: language.to_string(),
            },
        );
    }

    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }

    pub async fn language(&self, phone_number: &str) -> Option<String> {
        self.accounts
            .read()
            .await
            .get(phone_number)
            .map(|a| a.language.clone())
    }

    pub async fn is_blocked(&self, phone_number: &str) -> bool {
        self.accounts
            .read()
            .await
            .get(phone_number)
            .is_some_and(|a| a.blocked)
    }

    pub async fn wards(&self, guardian: &str) -> Vec<String> {
        self.wards
            .read()
            .await
            .get(guardian)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn verify_pin(&self, phone_number: &str, pin: &str) -> Result<PinCheck, StoreError> {
        self.outage.check("accounts")?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(phone_number)
            .ok_or_else(|| StoreError::NotFound(phone_number.to_string()))?;

        if account.blocked {
            return Ok(PinCheck::Blocked);
        }
        if account.pin == pin {
            account.failed_attempts = 0;
            return Ok(PinCheck::Valid);
        }

        account.failed_attempts += 1;
        if account.failed_attempts >= MAX_PIN_ATTEMPTS {
            account.blocked = true;
            return Ok(PinCheck::Blocked);
        }
        Ok(PinCheck::Invalid {
            remaining: MAX_PIN_ATTEMPTS - account.failed_attempts,
        })
    }

    async fn update_language(&self, phone_number: &str, language: &str) -> Result<(), StoreError> {
        self.outage.check("accounts")?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(phone_number)
            .ok_or_else(|| StoreError::NotFound(phone_number.to_string()))?;
        account.language = language.to_string();
        Ok(())
    }

    async fn add_guardian(&self, guardian: &str, ward: &str) -> Result<(), StoreError> {
        self.outage.check("accounts")?;
        self.wards
            .write()
            .await
            .entry(guardian.to_string())
            .or_default()
            .push(ward.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfiles {
    profiles: RwLock<HashMap<String, PersonalInformation>>,
    outage: Outage,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfiles {
    async fn personal_information(&self, address: &str) -> Result<Option<PersonalInformation>, StoreError> {
        self.outage.check("profiles")?;
        Ok(self.profiles.read().await.get(address).cloned())
    }

    async fn upsert_personal_information(
        &self,
        address: &str,
        update: &PersonalInformation,
    ) -> Result<(), StoreError> {
        self.outage.check("profiles")?;
        let mut profiles = self.profiles.write().await;
        let merged = profiles
            .get(address)
            .map(|stored| stored.merged(update))
            .unwrap_or_else(|| update.clone());
        profiles.insert(address.to_string(), merged);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    languages: RwLock<HashMap<String, String>>,
    guardians: RwLock<HashMap<String, Vec<String>>>,
    outage: Outage,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }

    pub async fn language(&self, phone_number: &str) -> Option<String> {
        self.languages.read().await.get(phone_number).cloned()
    }

    pub async fn guardians(&self, ward: &str) -> Vec<String> {
        self.guardians
            .read()
            .await
            .get(ward)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AccountCache for MemoryCache {
    async fn set_language(&self, phone_number: &str, language: &str) -> Result<(), StoreError> {
        self.outage.check("cache")?;
        self.languages
            .write()
            .await
            .insert(phone_number.to_string(), language.to_string());
        Ok(())
    }

    async fn add_guardian(&self, ward: &str, guardian: &str) -> Result<(), StoreError> {
        self.outage.check("cache")?;
        let mut guardians = self.guardians.write().await;
        let list = guardians.entry(ward.to_string()).or_default();
        if !list.iter().any(|g| g == guardian) {
            list.push(guardian.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wrong_pins_eventually_block() {
        let accounts = MemoryAccounts::new();
        accounts.insert("+254700000001", "1234", "eng").await;

        assert_eq!(
            accounts.verify_pin("+254700000001", "0000").await,
            Ok(PinCheck::Invalid { remaining: 2 })
        );
        assert_eq!(
            accounts.verify_pin("+254700000001", "0000").await,
            Ok(PinCheck::Invalid { remaining: 1 })
        );
        assert_eq!(accounts.verify_pin("+254700000001", "0000").await, Ok(PinCheck::Blocked));
        assert_eq!(accounts.verify_pin("+254700000001", "1234").await, Ok(PinCheck::Blocked));
        assert!(accounts.is_blocked("+254700000001").await);
    }

    #[tokio::test]
    async fn correct_pin_resets_attempts() {
        let accounts = MemoryAccounts::new();
        accounts.insert("+254700000001", "1234", "eng").await;

        accounts.verify_pin("+254700000001", "0000").await.unwrap();
        assert_eq!(accounts.verify_pin("+254700000001", "1234").await, Ok(PinCheck::Valid));
        assert_eq!(
            accounts.verify_pin("+254700000001", "0000").await,
            Ok(PinCheck::Invalid { remaining: 2 })
        );
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let accounts = MemoryAccounts::new();
        let err = accounts.verify_pin("+254799999999", "1234").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let cache = MemoryCache::new();
        cache.set_unavailable(true);

        let err = cache.set_language("+254700000001", "swa").await.unwrap_err();
        assert_eq!(err, StoreError::Unavailable("cache".to_string()));
    }

    #[tokio::test]
    async fn profile_upserts_merge() {
        let profiles = MemoryProfiles::new();
        let first = PersonalInformation {
            given_names: Some("John".to_string()),
            ..PersonalInformation::default()
        };
        let second = PersonalInformation {
            location_name: Some("Nairobi".to_string()),
            ..PersonalInformation::default()
        };

        profiles.upsert_personal_information("0xabc", &first).await.unwrap();
        profiles.upsert_personal_information("0xabc", &second).await.unwrap();

        let stored = profiles.personal_information("0xabc").await.unwrap().unwrap();
        assert_eq!(stored.given_names.as_deref(), Some("John"));
        assert_eq!(stored.location_name.as_deref(), Some("Nairobi"));
    }
}
