//! Quarantine incident selection and upsert

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use imis_core::{IncidentBatch, Patient, QuarantineIncident, QuarantineIncidentInput, QuarantinePolicy, ValidationError};

use super::ServiceError;
use crate::store::{IncidentStore, PatientStore};

/// Quarantine incident operations
#[derive(Clone)]
pub struct QuarantineIncidentService {
    incidents: Arc<dyn IncidentStore>,
    patients: Arc<dyn PatientStore>,
    policy: Arc<dyn QuarantinePolicy>,
}

impl QuarantineIncidentService {
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        patients: Arc<dyn PatientStore>,
        policy: Arc<dyn QuarantinePolicy>,
    ) -> Self {
        Self {
            incidents,
            patients,
            policy,
        }
    }

    /// Incidents the policy selects today, with their patients loaded.
    pub async fn selected_for_quarantine(&self) -> Result<IncidentBatch, ServiceError> {
        self.selected_on(Utc::now().date_naive()).await
    }

    pub async fn selected_on(&self, today: NaiveDate) -> Result<IncidentBatch, ServiceError> {
        let selected: Vec<QuarantineIncident> = self
            .incidents
            .list_all()
            .await?
            .into_iter()
            .filter(|incident| self.policy.selects(incident, today))
            .collect();

        let ids = IncidentBatch::patient_ids(&selected);
        let patients = self.patients.get_many(&ids).await?;
        tracing::debug!(selected = selected.len(), patients = patients.len(), "quarantine selection");
        Ok(IncidentBatch::new(selected, patients))
    }

    /// Create or update by id. Returns the saved incident and its patient.
    pub async fn save(
        &self,
        input: QuarantineIncidentInput,
    ) -> Result<(QuarantineIncident, Patient), ServiceError> {
        let now = Utc::now();
        let incident = input.into_incident(now.date_naive(), now)?;

        let patient = self
            .patients
            .get(&incident.patient_id)
            .await
            .map_err(|e| unknown_patient(e.into(), &incident.patient_id))?;

        let saved = self
            .incidents
            .upsert(&incident)
            .await
            .map_err(|e| unknown_patient(e.into(), &incident.patient_id))?;

        tracing::info!(incident_id = %saved.id, patient_id = %saved.patient_id, "incident saved");
        Ok((saved, patient))
    }
}

/// A missing patient is a fault of the submitted document, not a missing resource.
fn unknown_patient(err: ServiceError, patient_id: &str) -> ServiceError {
    match err {
        ServiceError::NotFound { resource: "patient", .. } => ValidationError::UnknownReference {
            resource: "patient",
            id: patient_id.to_owned(),
        }
        .into(),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use imis_core::{ActiveQuarantine, AllIncidents, CreatePatientDto, PatientId, PatientRef};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup(policy: Arc<dyn QuarantinePolicy>) -> (QuarantineIncidentService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let patient = CreatePatientDto {
            first_name: Some("Ana".into()),
            last_name: Some("Lee".into()),
            gender: Some("f".into()),
            date_of_birth: Some(date(1990, 1, 1)),
            ..Default::default()
        }
        .into_patient(|| PatientId::new("p1").unwrap(), Utc::now())
        .unwrap();
        store.insert(&patient).await.unwrap();

        let service = QuarantineIncidentService::new(store.clone(), store.clone(), policy);
        (service, store)
    }

    fn input(id: Option<Uuid>, until: Option<NaiveDate>) -> QuarantineIncidentInput {
        QuarantineIncidentInput {
            id,
            patient: PatientRef::Id("p1".into()),
            event_date: Some(date(2020, 3, 20)),
            until,
            comment: None,
        }
    }

    #[tokio::test]
    async fn empty_store_selects_nothing() {
        let (service, _) = setup(Arc::new(AllIncidents)).await;
        let batch = service.selected_for_quarantine().await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn upsert_by_id_keeps_count() {
        let (service, store) = setup(Arc::new(AllIncidents)).await;
        let (saved, patient) = service.save(input(None, None)).await.unwrap();
        assert_eq!(patient.id, "p1");
        assert_eq!(store.count().await.unwrap(), 1);

        let mut again = input(Some(saved.id), Some(date(2020, 4, 3)));
        again.comment = Some("decided".into());
        let (updated, _) = service.save(again).await.unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(store.count().await.unwrap(), 1);

        service.save(input(None, None)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_patient_is_validation_error() {
        let (service, store) = setup(Arc::new(AllIncidents)).await;
        let mut doc = input(None, None);
        doc.patient = PatientRef::Object { id: "ghost".into() };
        let err = service.save(doc).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::UnknownReference { resource: "patient", .. })
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn policy_filters_selection() {
        let (service, _) = setup(Arc::new(ActiveQuarantine)).await;
        service.save(input(None, Some(date(2020, 4, 3)))).await.unwrap();
        service.save(input(None, None)).await.unwrap();

        let batch = service.selected_on(date(2020, 4, 1)).await.unwrap();
        assert_eq!(batch.incidents.len(), 1);
        assert!(batch.patients.contains_key("p1"));

        let batch = service.selected_on(date(2020, 4, 4)).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn closure_policy_is_accepted() {
        let policy = |incident: &QuarantineIncident, _today: NaiveDate| incident.comment.is_some();
        let (service, _) = setup(Arc::new(policy)).await;
        let mut doc = input(None, None);
        doc.comment = Some("flagged".into());
        service.save(doc).await.unwrap();
        service.save(input(None, None)).await.unwrap();

        let batch = service.selected_for_quarantine().await.unwrap();
        assert_eq!(batch.incidents.len(), 1);
    }
}
