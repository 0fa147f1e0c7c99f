//! Typed session context for the reference USSD menus.

use crate::core::{DataValue, MachineContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    #[default]
    Active,
    Blocked,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub phone_number: String,
    /// Address used to key profile records.
    pub address: String,
    pub language: String,
    pub status: AccountStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "MALE" => Some(Self::Male),
            "FEMALE" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Profile fields. Every field is optional until the user supplies it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInformation {
    pub given_names: Option<String>,
    pub family_name: Option<String>,
    pub gender: Option<Gender>,
    pub year_of_birth: Option<i64>,
    pub location_name: Option<String>,
}

impl PersonalInformation {
    /// Field-level merge: values set in `update` win, the rest are kept.
    pub fn merged(&self, update: &PersonalInformation) -> Self {
        Self {
            given_names: update.given_names.clone().or_else(|| self.given_names.clone()),
            family_name: update.family_name.clone().or_else(|| self.family_name.clone()),
            gender: update.gender.or(self.gender),
            year_of_birth: update.year_of_birth.or(self.year_of_birth),
            location_name: update.location_name.clone().or_else(|| self.location_name.clone()),
        }
    }

    pub fn to_value(&self) -> DataValue {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: Option<DataValue>| {
            map.insert(key.to_string(), value.unwrap_or_default());
        };
        put("given_names", self.given_names.clone().map(DataValue::Text));
        put("family_name", self.family_name.clone().map(DataValue::Text));
        put("gender", self.gender.map(|g| DataValue::from(g.as_str())));
        put("year_of_birth", self.year_of_birth.map(DataValue::Int));
        put("location_name", self.location_name.clone().map(DataValue::Text));
        DataValue::Map(map)
    }

    pub fn from_value(value: &DataValue) -> Self {
        let text = |key: &str| value.get(key).and_then(DataValue::as_str).map(str::to_string);
        Self {
            given_names: text("given_names"),
            family_name: text("family_name"),
            gender: value
                .get("gender")
                .and_then(DataValue::as_str)
                .and_then(Gender::parse),
            year_of_birth: value.get("year_of_birth").and_then(DataValue::as_int),
            location_name: text("location_name"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphUser {
    pub id: u64,
    pub personal_information: PersonalInformation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub account: Account,
    pub graph: Option<GraphUser>,
    pub guardians: Vec<String>,
}

impl User {
    /// Stored profile, if the identity service knows this user.
    pub fn profile(&self) -> Option<&PersonalInformation> {
        self.graph.as_ref().map(|g| &g.personal_information)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageData {
    pub selected: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardianData {
    /// Phone number entered for the guardian being added.
    pub candidate: Option<String>,
}

/// Per-feature working data. Each feature owns one named field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureData {
    pub languages: LanguageData,
    pub personal_information: PersonalInformation,
    pub guardians: GuardianData,
    /// Free-form values for features without a typed field.
    pub extra: BTreeMap<String, DataValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UssdContext {
    pub user: User,
    pub data: FeatureData,
    /// Messages collected from classified service failures.
    pub errors: Vec<String>,
    pub feedback: Option<String>,
}

impl UssdContext {
    pub fn for_account(account: Account) -> Self {
        Self {
            user: User {
                account,
                ..User::default()
            },
            ..Self::default()
        }
    }

    pub fn phone_number(&self) -> &str {
        &self.user.account.phone_number
    }

    pub fn is_blocked(&self) -> bool {
        self.user.account.status == AccountStatus::Blocked
    }
}

impl MachineContext for UssdContext {
    fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    fn set_feedback(&mut self, feedback: Option<String>) {
        self.feedback = feedback;
    }

    /// Profile fields resolve to the stored profile overlaid with any
    /// pending edits.
    fn placeholder(&self, name: &str) -> Option<String> {
        let profile = self
            .user
            .profile()
            .cloned()
            .unwrap_or_default()
            .merged(&self.data.personal_information);

        match name {
            "phone_number" => Some(self.user.account.phone_number.clone()),
            "language" => Some(self.user.account.language.clone()),
            "selected_language" => self.data.languages.selected.clone(),
            "guardian" => self.data.guardians.candidate.clone(),
            "guardians" => Some(self.user.guardians.join(", ")),
            "given_names" => profile.given_names,
            "family_name" => profile.family_name,
            "gender" => profile.gender.map(|g| g.as_str().to_string()),
            "year_of_birth" => profile.year_of_birth.map(|y| y.to_string()),
            "location_name" => profile.location_name,
            _ => None,
        }
    }
}
