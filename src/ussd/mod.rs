//! Reference USSD menus driven by the engine.
//!
//! Each feature module exposes its `definition()`, the `registry()` binding
//! its guards, actions and services, and an `interpreter()` combining both.
//! Services run against [`Resources`], the set of backends a deployment
//! supplies.

pub mod auth;
pub mod context;
pub mod guardians;
pub mod guards;
pub mod languages;
pub mod profile;
pub mod resources;

pub use context::{Account, AccountStatus, Gender, GraphUser, PersonalInformation, User, UssdContext};
pub use resources::{
    AccountCache, AccountStore, MemoryAccounts, MemoryCache, MemoryProfiles, PinCheck, ProfileStore, Resources,
    StoreError,
};

use crate::builder::BuildError;
use crate::session::{Orchestrator, SessionConfig, SessionStore};
use std::sync::Arc;

/// Orchestrator with every reference menu registered.
pub fn orchestrator(
    store: Arc<dyn SessionStore<UssdContext>>,
    config: SessionConfig,
) -> Result<Orchestrator<UssdContext, Resources>, BuildError> {
    Ok(Orchestrator::new(store, config)
        .machine(languages::interpreter()?)
        .machine(profile::interpreter()?)
        .machine(guardians::interpreter()?))
}
