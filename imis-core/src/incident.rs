//! Quarantine incidents

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::patient::{Patient, MAX_COMMENT_LEN};
use crate::validation::{max_len_opt, ValidationError};

/// Quarantine-relevant event tied to exactly one patient.
///
/// Written to JSON through [`crate::GraphEncoder`], which decides whether the
/// patient is inlined or referenced by id.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarantineIncident {
    pub id: Uuid,
    pub patient_id: String,
    pub event_date: NaiveDate,
    /// Last day of the quarantine, once decided
    pub until: Option<NaiveDate>,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a patient inside an incoming document.
///
/// Accepts either the bare id or any object carrying an `id` field, the two
/// shapes a client receives from identity-preserving output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatientRef {
    Id(String),
    Object { id: String },
}

impl PatientRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

/// Incident payload for create-or-update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineIncidentInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub patient: PatientRef,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl QuarantineIncidentInput {
    /// Validate and stamp server-computed fields.
    ///
    /// A missing `id` gets a fresh UUID, a missing `eventDate` becomes
    /// `today`, and `updatedAt` is always `now`, cut to microseconds.
    pub fn into_incident(
        self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<QuarantineIncident, ValidationError> {
        let patient_id = self.patient.id().to_owned();
        if patient_id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "patient" });
        }
        max_len_opt("comment", self.comment.as_deref(), MAX_COMMENT_LEN)?;

        let event_date = self.event_date.unwrap_or(today);
        if matches!(self.until, Some(until) if until < event_date) {
            return Err(ValidationError::InvalidFormat {
                field: "until",
                reason: "must not be earlier than eventDate",
            });
        }

        Ok(QuarantineIncident {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            patient_id,
            event_date,
            until: self.until,
            comment: self.comment,
            updated_at: now.trunc_subsecs(6),
        })
    }
}

/// Incidents together with the patients they reference.
#[derive(Debug, Clone, Default)]
pub struct IncidentBatch {
    pub incidents: Vec<QuarantineIncident>,
    pub patients: HashMap<String, Patient>,
}

impl IncidentBatch {
    pub fn new(incidents: Vec<QuarantineIncident>, patients: impl IntoIterator<Item = Patient>) -> Self {
        Self {
            incidents,
            patients: patients.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Distinct patient ids, in first-seen order.
    pub fn patient_ids(incidents: &[QuarantineIncident]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        incidents
            .iter()
            .filter(|incident| seen.insert(incident.patient_id.as_str()))
            .map(|incident| incident.patient_id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

/// Wire shape of an incident's scalar fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IncidentFields<'a> {
    pub id: &'a Uuid,
    pub event_date: &'a NaiveDate,
    pub until: &'a Option<NaiveDate>,
    pub comment: &'a Option<String>,
    pub updated_at: &'a DateTime<Utc>,
}

impl<'a> From<&'a QuarantineIncident> for IncidentFields<'a> {
    fn from(i: &'a QuarantineIncident) -> Self {
        Self {
            id: &i.id,
            event_date: &i.event_date,
            until: &i.until,
            comment: &i.comment,
            updated_at: &i.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn patient_ref_accepts_both_shapes() {
        let by_id: PatientRef = serde_json::from_value(json!("p-1")).unwrap();
        let by_object: PatientRef =
            serde_json::from_value(json!({ "id": "p-1", "firstName": "Ana" })).unwrap();
        assert_eq!(by_id.id(), "p-1");
        assert_eq!(by_object.id(), "p-1");
    }

    #[test]
    fn fills_server_fields() {
        let input: QuarantineIncidentInput =
            serde_json::from_value(json!({ "patient": "p-1" })).unwrap();
        let now = DateTime::parse_from_rfc3339("2020-03-20T08:00:00.987654321Z")
            .unwrap()
            .with_timezone(&Utc);
        let incident = input.into_incident(day(2020, 3, 20), now).unwrap();
        assert_eq!(incident.patient_id, "p-1");
        assert_eq!(incident.event_date, day(2020, 3, 20));
        assert_eq!(incident.until, None);
        assert_eq!(incident.updated_at.timestamp_subsec_nanos(), 987_654_000);
    }

    #[test]
    fn keeps_supplied_id() {
        let id = Uuid::new_v4();
        let input: QuarantineIncidentInput = serde_json::from_value(json!({
            "id": id,
            "patient": { "id": "p-1" },
            "eventDate": "2020-03-20",
            "until": "2020-04-03"
        }))
        .unwrap();
        let incident = input.into_incident(day(2020, 3, 25), Utc::now()).unwrap();
        assert_eq!(incident.id, id);
        assert_eq!(incident.until, Some(day(2020, 4, 3)));
    }

    #[test]
    fn rejects_until_before_event_date() {
        let input: QuarantineIncidentInput = serde_json::from_value(json!({
            "patient": "p-1",
            "eventDate": "2020-03-20",
            "until": "2020-03-19"
        }))
        .unwrap();
        let err = input.into_incident(day(2020, 3, 20), Utc::now()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field: "until", .. }));
    }

    #[test]
    fn rejects_blank_patient() {
        let input: QuarantineIncidentInput =
            serde_json::from_value(json!({ "patient": "  " })).unwrap();
        assert_eq!(
            input.into_incident(day(2020, 1, 1), Utc::now()).unwrap_err(),
            ValidationError::Empty { field: "patient" }
        );
    }

    #[test]
    fn patient_ids_are_distinct_in_order() {
        let mk = |pid: &str| QuarantineIncident {
            id: Uuid::new_v4(),
            patient_id: pid.into(),
            event_date: day(2020, 1, 1),
            until: None,
            comment: None,
            updated_at: Utc::now(),
        };
        let incidents = vec![mk("b"), mk("a"), mk("b"), mk("c"), mk("a")];
        assert_eq!(IncidentBatch::patient_ids(&incidents), vec!["b", "a", "c"]);
    }
}
