//! Profile menu: edit and view personal information.
//!
//! Editing one field walks the user through any other fields the profile
//! still lacks (gender, then year of birth, then location) before asking for
//! the PIN that authorizes the change.

use crate::builder::{target, BuildError, InvokeBuilder, MachineBuilder, Registry, StateBuilder};
use crate::core::{DataValue, Event, EventKind, MachineDefinition, Tag};
use crate::effects::{service_fn, Interpreter, ServiceError};
use crate::ussd::auth::{validate_pin, INVALID_PIN};
use crate::ussd::context::{Gender, GraphUser, PersonalInformation, UssdContext};
use crate::ussd::guards::{common, has_code};
use crate::ussd::resources::Resources;
use chrono::{Datelike, Utc};

pub const MACHINE_ID: &str = "profile";
pub const CHANGE_ERROR: &str = "CHANGE_ERROR";
pub const LOAD_ERROR: &str = "LOAD_ERROR";

const EARLIEST_YEAR_OF_BIRTH: i64 = 1900;

fn retry(id: &str, feedback: &str, back_to: &str) -> StateBuilder {
    StateBuilder::new(id)
        .raise_retry(feedback)
        .on(EventKind::Retry, target(back_to))
}

pub fn definition() -> Result<MachineDefinition, BuildError> {
    MachineBuilder::new(MACHINE_ID)
        .initial("profileMenu")
        .state(StateBuilder::final_state("accountBlocked").tag(Tag::Error))
        .state(
            StateBuilder::new("authorizingProfileChange")
                .tag(Tag::Invoked)
                .invoke(
                    InvokeBuilder::new("initiateProfileChange")
                        .on_done(target("profileChangeSuccess").when("isSuccess").act("applyProfileChange"))
                        .on_error(target("accountBlocked").when("isBlocked").act("updateErrorMessages"))
                        .on_error(target("changeError").when("isChangeError").act("updateErrorMessages"))
                        .on_error(target("invalidPinPC").when("isInvalidPin").act("updateErrorMessages")),
                ),
        )
        .state(
            StateBuilder::new("authorizingProfileView")
                .tag(Tag::Invoked)
                .invoke(
                    InvokeBuilder::new("loadPersonalInformation")
                        .on_done(target("displayingProfile").when("isSuccess").act("savePersonalInformation"))
                        .on_error(target("accountBlocked").when("isBlocked"))
                        .on_error(target("loadError").when("isLoadError").act("updateErrorMessages"))
                        .on_error(target("invalidPinPV").when("isInvalidPin")),
                ),
        )
        .state(StateBuilder::final_state("changeError").tag(Tag::Error))
        .state(
            StateBuilder::final_state("displayingProfile")
                .describe("Displays the account's profile.")
                .tag(Tag::Resolved),
        )
        .state(
            StateBuilder::new("enteringFamilyName")
                .back(target("enteringGivenNames"))
                .transit(target("selectingGender").when("isValidNameGenderAbsent").act("saveFamilyName"))
                .transit(target("enteringProfileChangePin").when("isValidName").act("saveFamilyName"))
                .transit(target("invalidName")),
        )
        .state(
            StateBuilder::new("enteringGivenNames")
                .back(target("profileMenu"))
                .transit(target("enteringFamilyName").when("isValidName").act("saveGivenNames"))
                .transit(target("invalidName")),
        )
        .state(
            StateBuilder::new("enteringLocation")
                .back(target("profileMenu"))
                .transit(target("enteringProfileChangePin").when("isValidLocation").act("saveLocation"))
                .transit(target("invalidLocationEntry")),
        )
        .state(
            StateBuilder::new("enteringProfileChangePin")
                .tag(Tag::EncryptInput)
                .tag(Tag::Error)
                .back(target("profileMenu"))
                .transit(target("authorizingProfileChange")),
        )
        .state(
            StateBuilder::new("enteringProfileViewPin")
                .tag(Tag::EncryptInput)
                .tag(Tag::Error)
                .back(target("profileMenu"))
                .transit(target("authorizingProfileView")),
        )
        .state(
            StateBuilder::new("enteringYOB")
                .describe("Expects a year of birth between 1900 and the current year.")
                .back(target("profileMenu"))
                .transit(target("enteringLocation").when("isValidYOBLocationAbsent").act("saveYOB"))
                .transit(target("enteringProfileChangePin").when("isValidYOB").act("saveYOB"))
                .transit(target("invalidYOBEntry")),
        )
        .state(StateBuilder::final_state("exit"))
        .state(retry("invalidGenderOption", "invalidGenderOption", "selectingGender"))
        .state(retry("invalidLocationEntry", "invalidLocationOption", "enteringLocation"))
        .state(retry("invalidName", "invalidName", "enteringGivenNames"))
        .state(retry("invalidPinPC", "invalidPinPC", "enteringProfileChangePin"))
        .state(retry("invalidPinPV", "invalidPinPV", "enteringProfileViewPin").tag(Tag::Error))
        .state(retry("invalidYOBEntry", "invalidYOBOption", "enteringYOB"))
        .state(StateBuilder::final_state("loadError").tag(Tag::Error))
        .state(
            StateBuilder::new("profileChangeSuccess")
                .tag(Tag::Resolved)
                .back(target("settingsMenu"))
                .transit(target("exit").when("isOption9")),
        )
        .state(
            StateBuilder::new("profileMenu")
                .back(target("settingsMenu"))
                .transit(target("enteringGivenNames").when("isOption1"))
                .transit(target("selectingGender").when("isOption2"))
                .transit(target("enteringYOB").when("isOption3"))
                .transit(target("enteringLocation").when("isOption4"))
                .transit(target("enteringProfileViewPin").when("isOption5")),
        )
        .state(
            StateBuilder::new("selectingGender")
                .back(target("profileMenu"))
                .transit(target("enteringYOB").when("isValidGenderYOBAbsent").act("saveGender"))
                .transit(target("enteringProfileChangePin").when("isValidGender").act("saveGender"))
                .transit(target("invalidGenderOption")),
        )
        .state(StateBuilder::final_state("settingsMenu"))
        .build()
}

pub fn registry() -> Registry<UssdContext, Resources> {
    common(Registry::new())
        .guard("isValidName", is_valid_name)
        .guard("isValidNameGenderAbsent", |c: &UssdContext, e: &Event| {
            is_valid_name(c, e) && gender_absent(c)
        })
        .guard("isValidGender", is_valid_gender)
        .guard("isValidGenderYOBAbsent", |c: &UssdContext, e: &Event| {
            is_valid_gender(c, e) && year_of_birth_absent(c)
        })
        .guard("isValidYOB", is_valid_year_of_birth)
        .guard("isValidYOBLocationAbsent", |c: &UssdContext, e: &Event| {
            is_valid_year_of_birth(c, e) && location_absent(c)
        })
        .guard("isValidLocation", is_valid_location)
        .guard("isInvalidPin", has_code(INVALID_PIN))
        .guard("isChangeError", has_code(CHANGE_ERROR))
        .guard("isLoadError", has_code(LOAD_ERROR))
        .action("saveGivenNames", |mut c: UssdContext, e: &Event| {
            c.data.personal_information.given_names = Some(e.input().to_string());
            c
        })
        .action("saveFamilyName", |mut c: UssdContext, e: &Event| {
            c.data.personal_information.family_name = Some(e.input().to_string());
            c
        })
        .action("saveGender", |mut c: UssdContext, e: &Event| {
            c.data.personal_information.gender = parse_gender(e.input());
            c
        })
        .action("saveYOB", |mut c: UssdContext, e: &Event| {
            c.data.personal_information.year_of_birth = e.input().trim().parse().ok();
            c
        })
        .action("saveLocation", |mut c: UssdContext, e: &Event| {
            c.data.personal_information.location_name = Some(e.input().trim().to_string());
            c
        })
        .action("applyProfileChange", apply_profile_change)
        .action("savePersonalInformation", save_personal_information)
        .service("initiateProfileChange", service_fn(initiate_profile_change))
        .service("loadPersonalInformation", service_fn(load_personal_information))
}

pub fn interpreter() -> Result<Interpreter<UssdContext, Resources>, BuildError> {
    registry().interpreter(&definition()?)
}

/// One or two capitalized words, e.g. `John` or `Mary Ann`.
fn is_valid_name(_: &UssdContext, event: &Event) -> bool {
    let words: Vec<&str> = event.input().split(' ').collect();
    (1..=2).contains(&words.len())
        && words.iter().all(|word| {
            let mut chars = word.chars();
            chars.next().is_some_and(|c| c.is_ascii_uppercase())
                && chars.clone().next().is_some()
                && chars.all(|c| c.is_ascii_lowercase())
        })
}

fn parse_gender(input: &str) -> Option<Gender> {
    match input {
        "1" => Some(Gender::Male),
        "2" => Some(Gender::Female),
        _ => None,
    }
}

fn is_valid_gender(_: &UssdContext, event: &Event) -> bool {
    parse_gender(event.input()).is_some()
}

fn is_valid_year_of_birth(_: &UssdContext, event: &Event) -> bool {
    let current = i64::from(Utc::now().year());
    event
        .input()
        .trim()
        .parse::<i64>()
        .is_ok_and(|year| (EARLIEST_YEAR_OF_BIRTH..=current).contains(&year))
}

fn is_valid_location(_: &UssdContext, event: &Event) -> bool {
    let input = event.input().trim();
    !input.is_empty() && input.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

fn gender_absent(context: &UssdContext) -> bool {
    context.user.profile().and_then(|p| p.gender).is_none()
}

fn year_of_birth_absent(context: &UssdContext) -> bool {
    context.user.profile().and_then(|p| p.year_of_birth).is_none()
}

fn location_absent(context: &UssdContext) -> bool {
    context
        .user
        .profile()
        .and_then(|p| p.location_name.as_ref())
        .is_none()
}

fn apply_profile_change(mut context: UssdContext, _: &Event) -> UssdContext {
    let update = std::mem::take(&mut context.data.personal_information);
    let graph = context.user.graph.get_or_insert_with(GraphUser::default);
    graph.personal_information = graph.personal_information.merged(&update);
    context
}

fn save_personal_information(mut context: UssdContext, event: &Event) -> UssdContext {
    if let Some(profile) = event.output().and_then(|output| output.get("personal_information")) {
        let graph = context.user.graph.get_or_insert_with(GraphUser::default);
        graph.personal_information = PersonalInformation::from_value(profile);
    }
    context
}

async fn initiate_profile_change(
    resources: Resources,
    context: UssdContext,
    event: Event,
) -> Result<DataValue, ServiceError> {
    validate_pin(&resources, &context, event.input()).await?;

    resources
        .profiles
        .upsert_personal_information(&context.user.account.address, &context.data.personal_information)
        .await
        .map_err(|err| ServiceError::machine(CHANGE_ERROR, err.to_string()))?;

    Ok(DataValue::success())
}

async fn load_personal_information(
    resources: Resources,
    context: UssdContext,
    event: Event,
) -> Result<DataValue, ServiceError> {
    validate_pin(&resources, &context, event.input()).await?;

    let profile = resources
        .profiles
        .personal_information(&context.user.account.address)
        .await
        .map_err(|err| ServiceError::machine(LOAD_ERROR, err.to_string()))?
        .unwrap_or_default();

    let mut output = DataValue::success();
    if let DataValue::Map(map) = &mut output {
        map.insert("personal_information".to_string(), profile.to_value());
    }
    Ok(output)
}
