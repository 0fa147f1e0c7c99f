//! Guardian management: nominate another account as a PIN-reset guardian.

use crate::builder::{target, BuildError, InvokeBuilder, MachineBuilder, Registry, StateBuilder};
use crate::core::{DataValue, Event, EventKind, MachineDefinition, Tag};
use crate::effects::{service_fn, Interpreter, ServiceError};
use crate::ussd::auth::{validate_pin, INVALID_PIN};
use crate::ussd::context::UssdContext;
use crate::ussd::guards::{common, has_code};
use crate::ussd::resources::{joint, Resources, StoreError};

pub const MACHINE_ID: &str = "guardians";
pub const GUARDIAN_ADDITION_ERROR: &str = "GUARDIAN_ADDITION_ERROR";

pub fn definition() -> Result<MachineDefinition, BuildError> {
    MachineBuilder::new(MACHINE_ID)
        .initial("guardiansMenu")
        .state(StateBuilder::final_state("accountBlocked").tag(Tag::Error))
        .state(
            StateBuilder::new("addingGuardian")
                .describe("Invoked service that records the new guardian.")
                .tag(Tag::Invoked)
                .invoke(
                    InvokeBuilder::new("addGuardian")
                        .on_done(target("guardianAdditionSuccess").when("isSuccess").act("recordGuardian"))
                        .on_error(target("accountBlocked").when("isBlocked").act("updateErrorMessages"))
                        .on_error(target("invalidPinAG").when("isInvalidPin").act("updateErrorMessages"))
                        .on_error(
                            target("guardianAdditionError")
                                .when("isGuardianAdditionError")
                                .act("updateErrorMessages"),
                        ),
                ),
        )
        .state(
            StateBuilder::new("enteringAddGuardianPin")
                .tag(Tag::EncryptInput)
                .back(target("enteringNewGuardian"))
                .transit(target("accountBlocked").when("isBlocked"))
                .transit(target("addingGuardian")),
        )
        .state(
            StateBuilder::new("enteringNewGuardian")
                .describe("Expects the phone number of the new guardian.")
                .back(target("guardiansMenu"))
                .transit(target("enteringAddGuardianPin").when("isValidGuardian").act("saveGuardianEntry"))
                .transit(target("invalidGuardianEntry")),
        )
        .state(StateBuilder::final_state("exit"))
        .state(StateBuilder::final_state("guardianAdditionError").tag(Tag::Error))
        .state(
            StateBuilder::new("guardianAdditionSuccess")
                .tag(Tag::Resolved)
                .back(target("guardiansMenu"))
                .transit(target("exit").when("isOption9")),
        )
        .state(
            StateBuilder::new("guardiansMenu")
                .back(target("settingsMenu"))
                .transit(target("enteringNewGuardian").when("isOption1"))
                .transit(target("exit").when("isOption9")),
        )
        .state(
            StateBuilder::new("invalidGuardianEntry")
                .raise_retry("invalidGuardianEntry")
                .on(EventKind::Retry, target("enteringNewGuardian")),
        )
        .state(
            StateBuilder::new("invalidPinAG")
                .raise_retry("invalidPin")
                .on(EventKind::Retry, target("enteringAddGuardianPin")),
        )
        .state(StateBuilder::final_state("settingsMenu"))
        .build()
}

pub fn registry() -> Registry<UssdContext, Resources> {
    common(Registry::new())
        .guard("isValidGuardian", is_valid_guardian)
        .guard("isInvalidPin", has_code(INVALID_PIN))
        .guard("isGuardianAdditionError", has_code(GUARDIAN_ADDITION_ERROR))
        .action("saveGuardianEntry", |mut c: UssdContext, e: &Event| {
            c.data.guardians.candidate = Some(e.input().trim().to_string());
            c
        })
        .action("recordGuardian", record_guardian)
        .service("addGuardian", service_fn(add_guardian))
}

pub fn interpreter() -> Result<Interpreter<UssdContext, Resources>, BuildError> {
    registry().interpreter(&definition()?)
}

fn is_phone_number(input: &str) -> bool {
    let digits = input.strip_prefix('+').unwrap_or(input);
    (9..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// A well-formed number that is neither the user's own nor already a guardian.
fn is_valid_guardian(context: &UssdContext, event: &Event) -> bool {
    let input = event.input().trim();
    is_phone_number(input)
        && input != context.phone_number()
        && !context.user.guardians.iter().any(|g| g == input)
}

fn record_guardian(mut context: UssdContext, _: &Event) -> UssdContext {
    if let Some(guardian) = context.data.guardians.candidate.take() {
        context.user.guardians.push(guardian);
    }
    context
}

/// Record `guardian` for `ward` in the durable ledger and in the cache.
///
/// Both writes are awaited together. If one fails the call fails, but the
/// other may already have committed; nothing is rolled back.
pub async fn store_guardian(resources: &Resources, guardian: &str, ward: &str) -> Result<(), StoreError> {
    let (durable, cached) = tokio::join!(
        resources.accounts.add_guardian(guardian, ward),
        resources.cache.add_guardian(ward, guardian),
    );
    joint("add_guardian", durable, cached)
}

async fn add_guardian(resources: Resources, context: UssdContext, event: Event) -> Result<DataValue, ServiceError> {
    validate_pin(&resources, &context, event.input()).await?;

    let guardian = context
        .data
        .guardians
        .candidate
        .as_deref()
        .ok_or_else(|| ServiceError::machine(GUARDIAN_ADDITION_ERROR, "No guardian entered."))?;

    store_guardian(&resources, guardian, context.phone_number())
        .await
        .map_err(|err| ServiceError::machine(GUARDIAN_ADDITION_ERROR, err.to_string()))?;

    Ok(DataValue::success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ussd::context::Account;

    fn context() -> UssdContext {
        let mut context = UssdContext::for_account(Account {
            phone_number: "+254700000001".to_string(),
            ..Account::default()
        });
        context.user.guardians.push("+254700000003".to_string());
        context
    }

    #[test]
    fn definition_resolves() {
        assert!(interpreter().is_ok());
    }

    #[test]
    fn guardian_must_be_a_new_foreign_number() {
        let context = context();
        assert!(is_valid_guardian(&context, &Event::transit("+254700000002")));
        assert!(is_valid_guardian(&context, &Event::transit("0700000002")));
        assert!(!is_valid_guardian(&context, &Event::transit("+254700000001")));
        assert!(!is_valid_guardian(&context, &Event::transit("+254700000003")));
        assert!(!is_valid_guardian(&context, &Event::transit("12ab")));
    }

    #[test]
    fn recording_moves_candidate_into_guardians() {
        let mut context = context();
        context.data.guardians.candidate = Some("+254700000002".to_string());

        let context = record_guardian(context, &Event::transit("1234"));

        assert_eq!(context.data.guardians.candidate, None);
        assert!(context.user.guardians.contains(&"+254700000002".to_string()));
    }
}
