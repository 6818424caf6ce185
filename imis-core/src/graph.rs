//! Identity-preserving JSON documents.
//!
//! Within one response document a patient is written in full at its first
//! occurrence; every later occurrence (an event's back-reference, a second
//! incident of the same patient) is written as the bare patient id.
//!
//! Encoding runs in two passes over the document roots:
//! 1. plan: walk every patient occurrence in output order and record the
//!    slot of its first appearance;
//! 2. emit: walk again in the same order, inlining the patient only in its
//!    planned slot.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::event::PatientEvent;
use crate::incident::{IncidentBatch, IncidentFields, QuarantineIncident};
use crate::patient::Patient;

type Result<T> = std::result::Result<T, serde_json::Error>;

enum Root<'a> {
    Patient(&'a Patient),
    Incident(&'a QuarantineIncident, Option<&'a Patient>),
}

/// Builds a JSON document out of patients and incidents.
#[derive(Default)]
pub struct GraphEncoder<'a> {
    roots: Vec<Root<'a>>,
}

impl<'a> GraphEncoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a patient root.
    pub fn patient(mut self, patient: &'a Patient) -> Self {
        self.roots.push(Root::Patient(patient));
        self
    }

    /// Append an incident root. `patient` is the resolved owner, if loaded;
    /// an unresolved owner is always written as its id.
    pub fn incident(mut self, incident: &'a QuarantineIncident, patient: Option<&'a Patient>) -> Self {
        self.roots.push(Root::Incident(incident, patient));
        self
    }

    /// Encode all roots, one JSON value per root.
    pub fn encode(self) -> Result<Vec<Value>> {
        let mut plan = Slots::default();
        for root in &self.roots {
            match *root {
                Root::Patient(p) => plan.plan_patient(&p.id, Some(p)),
                Root::Incident(i, p) => plan.plan_patient(&i.patient_id, p),
            }
        }

        let mut emit = plan.rewind();
        self.roots
            .iter()
            .map(|root| match *root {
                Root::Patient(p) => emit.emit_patient(&p.id, Some(p)),
                Root::Incident(i, p) => emit.emit_incident(i, p),
            })
            .collect()
    }

    /// Single patient with its events.
    pub fn patient_document(patient: &Patient) -> Result<Value> {
        GraphEncoder::new().patient(patient).encode().map(single)
    }

    /// Single incident with its patient.
    pub fn incident_document(incident: &QuarantineIncident, patient: Option<&Patient>) -> Result<Value> {
        GraphEncoder::new().incident(incident, patient).encode().map(single)
    }

    /// Array of incidents; each patient is inlined once.
    pub fn incidents_document(batch: &IncidentBatch) -> Result<Value> {
        let encoder = batch.incidents.iter().fold(GraphEncoder::new(), |enc, incident| {
            enc.incident(incident, batch.patients.get(&incident.patient_id))
        });
        encoder.encode().map(Value::Array)
    }

    /// One value per patient, in the given order.
    pub fn patients_document(patients: &[Patient]) -> Result<Vec<Value>> {
        patients
            .iter()
            .fold(GraphEncoder::new(), |enc, patient| enc.patient(patient))
            .encode()
    }
}

fn single(mut values: Vec<Value>) -> Value {
    values.pop().unwrap_or(Value::Null)
}

/// First-occurrence slot of every patient id in the document.
#[derive(Default)]
struct Slots<'a> {
    first: HashMap<&'a str, usize>,
    next: usize,
}

impl<'a> Slots<'a> {
    fn take(&mut self) -> usize {
        let slot = self.next;
        self.next += 1;
        slot
    }

    fn plan_patient(&mut self, id: &'a str, resolved: Option<&'a Patient>) {
        let slot = self.take();
        let first = *self.first.entry(id).or_insert(slot);
        if first != slot {
            return;
        }
        if let Some(patient) = resolved {
            for event in &patient.events {
                self.plan_patient(&event.patient_id, None);
            }
        }
    }

    fn rewind(self) -> Self {
        Self {
            first: self.first,
            next: 0,
        }
    }

    fn emit_patient(&mut self, id: &'a str, resolved: Option<&'a Patient>) -> Result<Value> {
        let slot = self.take();
        match resolved {
            Some(patient) if self.first.get(id) == Some(&slot) => self.full_patient(patient),
            _ => Ok(Value::String(id.to_owned())),
        }
    }

    fn full_patient(&mut self, patient: &'a Patient) -> Result<Value> {
        let mut object = as_object(serde_json::to_value(patient)?);
        let events = patient
            .events
            .iter()
            .map(|event| self.emit_event(event))
            .collect::<Result<Vec<_>>>()?;
        object.insert("events".to_owned(), Value::Array(events));
        Ok(Value::Object(object))
    }

    fn emit_event(&mut self, event: &'a PatientEvent) -> Result<Value> {
        let mut object = as_object(serde_json::to_value(event)?);
        let owner = self.emit_patient(&event.patient_id, None)?;
        object.insert("patient".to_owned(), owner);
        Ok(Value::Object(object))
    }

    fn emit_incident(&mut self, incident: &'a QuarantineIncident, resolved: Option<&'a Patient>) -> Result<Value> {
        let mut object = as_object(serde_json::to_value(IncidentFields::from(incident))?);
        let patient = self.emit_patient(&incident.patient_id, resolved)?;
        object.insert("patient".to_owned(), patient);
        Ok(Value::Object(object))
    }
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::patient::{CreatePatientDto, PatientId};

    fn patient(id: &str, first: &str) -> Patient {
        let dto = CreatePatientDto {
            first_name: Some(first.into()),
            last_name: Some("Lee".into()),
            gender: Some("f".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            ..Default::default()
        };
        dto.into_patient(|| PatientId::new(id).unwrap(), Utc::now())
            .unwrap()
    }

    fn incident(patient_id: &str) -> QuarantineIncident {
        QuarantineIncident {
            id: Uuid::new_v4(),
            patient_id: patient_id.into(),
            event_date: NaiveDate::from_ymd_opt(2020, 3, 20).unwrap(),
            until: None,
            comment: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn patient_events_reference_owner_by_id() {
        let ana = patient("ana", "Ana");
        let doc = GraphEncoder::patient_document(&ana).unwrap();

        assert_eq!(doc["id"], "ana");
        assert_eq!(doc["firstName"], "Ana");
        let events = doc["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["patient"], "ana");
        assert_eq!(events[0]["eventType"], "REGISTERED");
    }

    #[test]
    fn repeated_patient_is_inlined_once() {
        let ana = patient("ana", "Ana");
        let bo = patient("bo", "Bo");
        let batch = IncidentBatch::new(
            vec![incident("ana"), incident("bo"), incident("ana")],
            vec![ana, bo],
        );

        let doc = GraphEncoder::incidents_document(&batch).unwrap();
        let items = doc.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["patient"]["id"], "ana");
        assert_eq!(items[1]["patient"]["id"], "bo");
        assert_eq!(items[2]["patient"], "ana");
    }

    #[test]
    fn unresolved_patient_is_a_reference() {
        let lone = incident("ghost");
        let doc = GraphEncoder::incident_document(&lone, None).unwrap();
        assert_eq!(doc["patient"], "ghost");
        assert_eq!(doc["eventDate"], "2020-03-20");
        assert!(doc["until"].is_null());
    }

    #[test]
    fn distinct_patients_are_all_inlined() {
        let people = vec![patient("a", "A"), patient("b", "B")];
        let docs = GraphEncoder::patients_document(&people).unwrap();
        assert_eq!(docs[0]["firstName"], "A");
        assert_eq!(docs[1]["firstName"], "B");
    }

    #[test]
    fn empty_batch_is_empty_array() {
        let doc = GraphEncoder::incidents_document(&IncidentBatch::default()).unwrap();
        assert_eq!(doc, Value::Array(vec![]));
    }
}
