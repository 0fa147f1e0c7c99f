//! Language selection menu.

use crate::builder::{target, BuildError, InvokeBuilder, MachineBuilder, Registry, StateBuilder};
use crate::core::{DataValue, Event, EventKind, MachineDefinition, Tag};
use crate::effects::{service_fn, Interpreter, ServiceError};
use crate::ussd::auth::{validate_pin, INVALID_PIN};
use crate::ussd::context::UssdContext;
use crate::ussd::guards::{common, has_code};
use crate::ussd::resources::{joint, Resources, StoreError};

pub const MACHINE_ID: &str = "languages";
pub const CHANGE_ERROR: &str = "CHANGE_ERROR";

/// Menu option, language code and display name.
pub const SUPPORTED_LANGUAGES: &[(&str, &str, &str)] = &[
    ("1", "eng", "English"),
    ("2", "swa", "Kiswahili"),
    ("3", "kam", "Kamba"),
    ("4", "kik", "Kikuyu"),
    ("5", "luo", "Dholuo"),
    ("6", "gir", "Giriama"),
];

fn language_for(option: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(key, _, _)| *key == option)
        .map(|(_, code, _)| *code)
}

pub fn definition() -> Result<MachineDefinition, BuildError> {
    // Every language set accepts any supported option.
    let choose = || target("enteringPin").when("isValidLanguageOption").act("saveLanguageSelection");

    MachineBuilder::new(MACHINE_ID)
        .initial("firstLanguageSet")
        .state(
            StateBuilder::final_state("accountBlocked")
                .describe("Account is blocked.")
                .tag(Tag::Error),
        )
        .state(
            StateBuilder::new("authorizingLanguageChange")
                .describe("Invoked service to authorize language change.")
                .tag(Tag::Invoked)
                .invoke(
                    InvokeBuilder::new("initiateLanguageChange")
                        .on_done(target("changeSuccess").when("isSuccess").act("saveAccountLanguage"))
                        .on_error(target("accountBlocked").when("isBlocked").act("updateErrorMessages"))
                        .on_error(target("invalidPin").when("isInvalidPin").act("updateErrorMessages"))
                        .on_error(target("changeError").when("isChangeError").act("updateErrorMessages")),
                ),
        )
        .state(
            StateBuilder::final_state("changeError")
                .describe("Language change failed.")
                .tag(Tag::Error),
        )
        .state(
            StateBuilder::new("changeSuccess")
                .describe("Language change is successful.")
                .tag(Tag::Resolved)
                .back(target("settingsMenu"))
                .transit(target("exit").when("isOption9")),
        )
        .state(
            StateBuilder::new("enteringPin")
                .describe("Expects valid PIN matching account's PIN.")
                .tag(Tag::EncryptInput)
                .tag(Tag::Error)
                .back(target("firstLanguageSet"))
                .transit(target("accountBlocked").when("isBlocked"))
                .transit(target("authorizingLanguageChange")),
        )
        .state(StateBuilder::final_state("exit").describe("Terminates USSD session."))
        .state(
            StateBuilder::new("firstLanguageSet")
                .describe("Expects language selection from first language set.")
                .back(target("settingsMenu"))
                .transit(choose())
                .transit(target("secondLanguageSet").when("isOption11"))
                .transit(target("exit").when("isOption00"))
                .transit(target("invalidLanguageOption")),
        )
        .state(
            StateBuilder::new("invalidLanguageOption")
                .describe("Invalid language option; retries language selection.")
                .raise_retry("invalidLanguage")
                .on(EventKind::Retry, target("firstLanguageSet")),
        )
        .state(
            StateBuilder::new("invalidPin")
                .describe("Invalid PIN; retries PIN entry.")
                .raise_retry("invalidPin")
                .on(EventKind::Retry, target("enteringPin")),
        )
        .state(
            StateBuilder::new("secondLanguageSet")
                .describe("Expects language selection from second language set.")
                .transit(choose())
                .transit(target("thirdLanguageSet").when("isOption11"))
                .transit(target("firstLanguageSet").when("isOption22"))
                .transit(target("invalidLanguageOption")),
        )
        .state(StateBuilder::final_state("settingsMenu").describe("Transitions to settings menu."))
        .state(
            StateBuilder::new("thirdLanguageSet")
                .describe("Expects language selection from third language set.")
                .transit(choose())
                .transit(target("secondLanguageSet").when("isOption22"))
                .transit(target("invalidLanguageOption")),
        )
        .build()
}

pub fn registry() -> Registry<UssdContext, Resources> {
    common(Registry::new())
        .guard("isValidLanguageOption", is_valid_language_option)
        .guard("isInvalidPin", has_code(INVALID_PIN))
        .guard("isChangeError", has_code(CHANGE_ERROR))
        .action("saveLanguageSelection", save_language_selection)
        .action("saveAccountLanguage", save_account_language)
        .service("initiateLanguageChange", service_fn(initiate_language_change))
}

pub fn interpreter() -> Result<Interpreter<UssdContext, Resources>, BuildError> {
    registry().interpreter(&definition()?)
}

fn is_valid_language_option(_: &UssdContext, event: &Event) -> bool {
    language_for(event.input()).is_some()
}

fn save_language_selection(mut context: UssdContext, event: &Event) -> UssdContext {
    context.data.languages.selected = language_for(event.input()).map(str::to_string);
    context
}

fn save_account_language(mut context: UssdContext, _: &Event) -> UssdContext {
    if let Some(selected) = &context.data.languages.selected {
        context.user.account.language = selected.clone();
    }
    context
}

/// Write the account's language to the durable store and the cache together.
pub async fn update_language(resources: &Resources, phone_number: &str, language: &str) -> Result<(), StoreError> {
    let (durable, cached) = tokio::join!(
        resources.accounts.update_language(phone_number, language),
        resources.cache.set_language(phone_number, language),
    );
    joint("update_language", durable, cached)
}

async fn initiate_language_change(
    resources: Resources,
    context: UssdContext,
    event: Event,
) -> Result<DataValue, ServiceError> {
    validate_pin(&resources, &context, event.input()).await?;

    let selected = context
        .data
        .languages
        .selected
        .as_deref()
        .ok_or_else(|| ServiceError::machine(CHANGE_ERROR, "No language selected."))?;

    update_language(&resources, context.phone_number(), selected)
        .await
        .map_err(|err| ServiceError::machine(CHANGE_ERROR, format!("Language change failed: {err}")))?;

    Ok(DataValue::success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_resolves() {
        let interpreter = interpreter().unwrap();
        assert_eq!(interpreter.id(), MACHINE_ID);
        assert!(interpreter.machine().is_terminal("changeError"));
        assert!(!interpreter.machine().is_terminal("changeSuccess"));
    }

    #[test]
    fn only_supported_options_are_valid() {
        let context = UssdContext::default();
        assert!(is_valid_language_option(&context, &Event::transit("2")));
        assert!(!is_valid_language_option(&context, &Event::transit("11")));
        assert!(!is_valid_language_option(&context, &Event::transit("eng")));
    }

    #[test]
    fn selection_stores_language_code() {
        let context = save_language_selection(UssdContext::default(), &Event::transit("2"));
        assert_eq!(context.data.languages.selected.as_deref(), Some("swa"));
    }
}
