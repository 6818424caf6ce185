//! Patient status events

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationError;

/// Lifecycle status recorded by a [`PatientEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientStatus {
    Registered,
    Suspected,
    ScheduledForTesting,
    TestSubmittedInProgress,
    TestFinishedPositive,
    TestFinishedNegative,
    TestFinishedInvalid,
    TestFinishedRecovered,
    TestFinishedNotRecovered,
    PatientDead,
    DoctorsVisit,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Suspected => "SUSPECTED",
            Self::ScheduledForTesting => "SCHEDULED_FOR_TESTING",
            Self::TestSubmittedInProgress => "TEST_SUBMITTED_IN_PROGRESS",
            Self::TestFinishedPositive => "TEST_FINISHED_POSITIVE",
            Self::TestFinishedNegative => "TEST_FINISHED_NEGATIVE",
            Self::TestFinishedInvalid => "TEST_FINISHED_INVALID",
            Self::TestFinishedRecovered => "TEST_FINISHED_RECOVERED",
            Self::TestFinishedNotRecovered => "TEST_FINISHED_NOT_RECOVERED",
            Self::PatientDead => "PATIENT_DEAD",
            Self::DoctorsVisit => "DOCTORS_VISIT",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Registered,
            Self::Suspected,
            Self::ScheduledForTesting,
            Self::TestSubmittedInProgress,
            Self::TestFinishedPositive,
            Self::TestFinishedNegative,
            Self::TestFinishedInvalid,
            Self::TestFinishedRecovered,
            Self::TestFinishedNotRecovered,
            Self::PatientDead,
            Self::DoctorsVisit,
        ]
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVariant {
                field: "eventType",
                value: s.to_owned(),
            })
    }
}

/// Status event owned by a patient.
///
/// `patient_id` is the back-reference to the owning patient; it is emitted as
/// the bare id string because the owner is always written first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEvent {
    pub id: Uuid,
    #[serde(rename = "patient")]
    pub patient_id: String,
    pub event_type: PatientStatus,
    pub event_timestamp: DateTime<Utc>,
    pub comment: Option<String>,
}

impl PatientEvent {
    /// Registration event recorded when a patient is created.
    ///
    /// The timestamp is cut to microseconds, the precision of `TIMESTAMPTZ`,
    /// so the value handed back on create equals the one read back later.
    pub fn registered(patient_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: patient_id.to_owned(),
            event_type: PatientStatus::Registered,
            event_timestamp: at.trunc_subsecs(6),
            comment: None,
        }
    }
}
