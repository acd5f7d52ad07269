//! Person record and the payload shapes that feed it.
//!
//! # Responsibility
//! - Define the stored `Person` document and its nested `Address`.
//! - Convert caller payloads (`PersonInput`) and CRM rows (`RemoteContact`)
//!   into stored records with locally assigned identity.
//!
//! # Invariants
//! - `id` is assigned locally and never taken from callers or the CRM.
//! - `model_id` is non-blank and trimmed; it is the reconciliation join key.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Locally assigned, provider-neutral person identifier.
pub type PersonId = Uuid;

/// Postal address attached to a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Stored person document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    /// Correlation key shared with the CRM contact.
    pub model_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    /// Unix epoch milliseconds of the last local write.
    pub last_modified: i64,
}

/// Caller-supplied person payload for create/update.
///
/// Carries no `id` or `lastModified`; such keys in a JSON body are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonInput {
    pub model_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// One contact row as returned by the CRM endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteContact {
    pub model_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Validation failures for person records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    BlankModelId,
    /// `model_id` carries leading or trailing whitespace.
    UntrimmedModelId(String),
    NegativeTimestamp(i64),
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankModelId => write!(f, "person model_id must not be blank"),
            Self::UntrimmedModelId(value) => {
                write!(f, "person model_id `{value}` has surrounding whitespace")
            }
            Self::NegativeTimestamp(value) => {
                write!(f, "person last_modified must be >= 0, got {value}")
            }
        }
    }
}

impl Error for PersonValidationError {}

impl Person {
    /// Builds a new record from a caller payload with a fresh `id`.
    ///
    /// A blank or missing `model_id` falls back to the new id, so records
    /// created locally still carry a usable correlation key.
    pub fn from_input(input: PersonInput, last_modified: i64) -> Self {
        Self::with_id_from_input(Uuid::new_v4(), input, last_modified)
    }

    /// Builds a record for a known `id` from a caller payload.
    pub fn with_id_from_input(id: PersonId, input: PersonInput, last_modified: i64) -> Self {
        let model_id = input
            .model_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| id.to_string());
        Self {
            id,
            model_id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            last_modified,
        }
    }

    /// Builds a new local record for a CRM contact with a fresh `id`.
    pub fn from_remote(contact: &RemoteContact, last_modified: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_id: contact.model_id.trim().to_string(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            address: contact.address.clone(),
            last_modified,
        }
    }

    /// Checks record invariants before persistence.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.model_id.trim().is_empty() {
            return Err(PersonValidationError::BlankModelId);
        }
        if self.model_id.trim() != self.model_id {
            return Err(PersonValidationError::UntrimmedModelId(
                self.model_id.clone(),
            ));
        }
        if self.last_modified < 0 {
            return Err(PersonValidationError::NegativeTimestamp(self.last_modified));
        }
        Ok(())
    }
}

impl RemoteContact {
    /// Returns the trimmed correlation key.
    pub fn key(&self) -> &str {
        self.model_id.trim()
    }
}
