//! Session-level types: the registered user, quick replies, input kinds and
//! the record persisted between restarts.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::wire::null_as_default;

/// A registered visitor as returned by the service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Data submitted by the registration form.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationData {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{10,15}$").expect("valid phone pattern"))
}

impl RegistrationData {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Check the form rules and return the trimmed data that should be sent.
    ///
    /// The phone number may contain separators; only its digits are counted.
    pub fn validate(&self) -> Result<RegistrationData, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(ValidationError::PhoneRequired);
        }
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if !phone_pattern().is_match(&digits) {
            return Err(ValidationError::InvalidPhone);
        }

        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string);

        Ok(RegistrationData {
            name: name.to_string(),
            phone: phone.to_string(),
            email,
        })
    }
}

/// A quick-reply affordance offered by the service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatOption {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl ChatOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Text sent back to the service when this option is picked.
    pub fn reply_text(&self) -> &str {
        if self.value.is_empty() {
            &self.label
        } else {
            &self.value
        }
    }
}

/// The kind of input the service expects next.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    File,
}

impl InputType {
    /// Map the service's `input_type` field; anything but `file` means text.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("file") => Self::File,
            _ => Self::Text,
        }
    }
}

/// Who is answering on the service side.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Bot,
    LiveAgent,
}

impl ChatMode {
    /// Map the service's `mode` field. Unknown values return `None` so the
    /// caller can keep its current mode.
    pub fn from_wire(value: Option<&str>) -> Option<Self> {
        match value {
            Some("live_agent") => Some(Self::LiveAgent),
            Some("bot") => Some(Self::Bot),
            _ => None,
        }
    }

    pub fn from_flag(is_live_agent: bool) -> Self {
        if is_live_agent {
            Self::LiveAgent
        } else {
            Self::Bot
        }
    }

    pub fn is_live_agent(self) -> bool {
        self == Self::LiveAgent
    }
}

/// Session fields stored next to the user so a reload can resume.
///
/// Field names match what the browser widget stores, so both can share a
/// store.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub is_live_agent_mode: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_options: Vec<ChatOption>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_input_type: InputType,
}
