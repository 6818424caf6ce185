//! Patient entity and its creation payload

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::event::PatientEvent;
use crate::string_list;
use crate::validation::{max_len, max_len_opt, required, ValidationError};

/// Maximum length for short text fields (names, contact, insurance)
pub const MAX_TEXT_LEN: usize = 255;

/// Maximum length for the free-text comment
pub const MAX_COMMENT_LEN: usize = 4000;

/// Maximum length for caller-supplied patient ids
const MAX_PATIENT_ID_LEN: usize = 64;

static PATIENT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").expect("invalid patient id regex")
});

/// Validated patient identifier.
///
/// Only used where an id is *assigned*; lookups accept any string and simply
/// miss when it was never assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientId(String);

impl PatientId {
    /// Validate a caller-supplied id.
    ///
    /// ```
    /// use imis_core::PatientId;
    ///
    /// assert!(PatientId::new("hb-2020-0001").is_ok());
    /// assert!(PatientId::new("-leading-dash").is_err());
    /// assert!(PatientId::new("").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "id" });
        }
        if s.len() > MAX_PATIENT_ID_LEN {
            return Err(ValidationError::TooLong {
                field: "id",
                max: MAX_PATIENT_ID_LEN,
            });
        }
        if !PATIENT_ID_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "id",
                reason: "must be alphanumeric with hyphens/underscores, starting with alphanumeric",
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Server-assigned id (hyphenated UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Occupation-related infection risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskOccupation {
    NoRiskOccupation,
    MedicalStaff,
    Caregiver,
    PublicSafety,
    Education,
    PublicTransport,
    Retail,
    OtherContactOccupation,
}

impl RiskOccupation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRiskOccupation => "NO_RISK_OCCUPATION",
            Self::MedicalStaff => "MEDICAL_STAFF",
            Self::Caregiver => "CAREGIVER",
            Self::PublicSafety => "PUBLIC_SAFETY",
            Self::Education => "EDUCATION",
            Self::PublicTransport => "PUBLIC_TRANSPORT",
            Self::Retail => "RETAIL",
            Self::OtherContactOccupation => "OTHER_CONTACT_OCCUPATION",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::NoRiskOccupation,
            Self::MedicalStaff,
            Self::Caregiver,
            Self::PublicSafety,
            Self::Education,
            Self::PublicTransport,
            Self::Retail,
            Self::OtherContactOccupation,
        ]
    }
}

impl fmt::Display for RiskOccupation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskOccupation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|occupation| occupation.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "riskOccupation",
                value: s.to_owned(),
            })
    }
}

/// Registered patient.
///
/// `Serialize` emits the patient's own fields only. Documents containing
/// patients (with their events) are written through [`crate::GraphEncoder`],
/// which owns reference handling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,

    pub last_name: String,
    pub first_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,

    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub zip: Option<i32>,
    pub city: Option<String>,

    pub insurance_company: Option<String>,
    pub insurance_membership_number: Option<String>,
    pub confirmed: bool,

    pub flu_immunization: Option<bool>,
    pub speed_of_symptoms_outbreak: Option<String>,
    pub symptoms: Vec<String>,
    pub corona_contacts: Option<bool>,
    pub risk_areas: Vec<String>,
    pub weakened_immune_system: Option<bool>,
    pub pre_illnesses: Vec<String>,
    pub risk_occupation: Option<RiskOccupation>,

    pub comment: Option<String>,
    pub occupation: Option<String>,

    #[serde(skip)]
    pub events: Vec<PatientEvent>,
}

/// Patient creation payload.
///
/// Every field is optional at the serde level so that missing required
/// fields surface as [`ValidationError::Empty`] rather than a parse error.
/// Lists and `confirmed` also accept an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePatientDto {
    pub id: Option<String>,

    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,

    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub zip: Option<i32>,
    pub city: Option<String>,

    pub insurance_company: Option<String>,
    pub insurance_membership_number: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub confirmed: bool,

    pub flu_immunization: Option<bool>,
    pub speed_of_symptoms_outbreak: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub symptoms: Vec<String>,
    pub corona_contacts: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub risk_areas: Vec<String>,
    pub weakened_immune_system: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub pre_illnesses: Vec<String>,
    pub risk_occupation: Option<RiskOccupation>,

    pub comment: Option<String>,
    pub occupation: Option<String>,
}

/// `null` deserializes like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl CreatePatientDto {
    /// Validate the payload and build the patient to persist.
    ///
    /// A caller-supplied `id` is validated and kept; otherwise `assign_id`
    /// provides one. The patient starts with a single REGISTERED event
    /// stamped `registered_at`.
    pub fn into_patient(
        self,
        assign_id: impl FnOnce() -> PatientId,
        registered_at: DateTime<Utc>,
    ) -> Result<Patient, ValidationError> {
        let id = match self.id.as_deref() {
            Some(raw) => PatientId::new(raw)?,
            None => assign_id(),
        };

        let last_name = required("lastName", self.last_name)?;
        let first_name = required("firstName", self.first_name)?;
        let gender = required("gender", self.gender)?;
        let date_of_birth = self
            .date_of_birth
            .ok_or(ValidationError::Empty { field: "dateOfBirth" })?;

        max_len("lastName", &last_name, MAX_TEXT_LEN)?;
        max_len("firstName", &first_name, MAX_TEXT_LEN)?;
        max_len("gender", &gender, MAX_TEXT_LEN)?;
        for (field, value) in [
            ("email", &self.email),
            ("phoneNumber", &self.phone_number),
            ("street", &self.street),
            ("houseNumber", &self.house_number),
            ("city", &self.city),
            ("insuranceCompany", &self.insurance_company),
            ("insuranceMembershipNumber", &self.insurance_membership_number),
            ("speedOfSymptomsOutbreak", &self.speed_of_symptoms_outbreak),
            ("occupation", &self.occupation),
        ] {
            max_len_opt(field, value.as_deref(), MAX_TEXT_LEN)?;
        }
        max_len_opt("comment", self.comment.as_deref(), MAX_COMMENT_LEN)?;

        if let Some(email) = self.email.as_deref() {
            if !email.contains('@') {
                return Err(ValidationError::InvalidFormat {
                    field: "email",
                    reason: "must contain '@'",
                });
            }
        }
        if matches!(self.zip, Some(zip) if zip < 0) {
            return Err(ValidationError::Negative { field: "zip" });
        }

        string_list::check("symptoms", &self.symptoms)?;
        string_list::check("riskAreas", &self.risk_areas)?;
        string_list::check("preIllnesses", &self.pre_illnesses)?;

        let id = id.into_string();
        let events = vec![PatientEvent::registered(&id, registered_at)];

        Ok(Patient {
            id,
            last_name,
            first_name,
            gender,
            date_of_birth,
            email: self.email,
            phone_number: self.phone_number,
            street: self.street,
            house_number: self.house_number,
            zip: self.zip,
            city: self.city,
            insurance_company: self.insurance_company,
            insurance_membership_number: self.insurance_membership_number,
            confirmed: self.confirmed,
            flu_immunization: self.flu_immunization,
            speed_of_symptoms_outbreak: self.speed_of_symptoms_outbreak,
            symptoms: self.symptoms,
            corona_contacts: self.corona_contacts,
            risk_areas: self.risk_areas,
            weakened_immune_system: self.weakened_immune_system,
            pre_illnesses: self.pre_illnesses,
            risk_occupation: self.risk_occupation,
            comment: self.comment,
            occupation: self.occupation,
            events,
        })
    }
}
