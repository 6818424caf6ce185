//! In-process store for development and tests

use std::collections::BTreeMap;

use async_trait::async_trait;
use imis_core::{Paginated, Pagination, Patient, QuarantineIncident};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IncidentStore, PatientStore, StoreError};

/// Patients and incidents kept in memory.
///
/// Writers are serialized by the locks; the incident map checks the patient
/// map the way the Postgres foreign key does.
#[derive(Default)]
pub struct MemoryStore {
    patients: RwLock<BTreeMap<String, Patient>>,
    incidents: RwLock<BTreeMap<Uuid, QuarantineIncident>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn insert(&self, patient: &Patient) -> Result<Patient, StoreError> {
        let mut patients = self.patients.write().await;
        if patients.contains_key(&patient.id) {
            return Err(StoreError::Conflict {
                resource: "patient",
                id: patient.id.clone(),
            });
        }
        patients.insert(patient.id.clone(), patient.clone());
        Ok(patient.clone())
    }

    async fn get(&self, id: &str) -> Result<Patient, StoreError> {
        self.patients
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                resource: "patient",
                id: id.to_owned(),
            })
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Patient>, StoreError> {
        let patients = self.patients.read().await;
        Ok(ids.iter().filter_map(|id| patients.get(id).cloned()).collect())
    }

    async fn list(&self, page: Pagination) -> Result<Paginated<Patient>, StoreError> {
        let patients = self.patients.read().await;
        let mut all: Vec<&Patient> = patients.values().collect();
        all.sort_by(|a, b| {
            (&a.last_name, &a.first_name, &a.id).cmp(&(&b.last_name, &b.first_name, &b.id))
        });

        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok(Paginated::new(items, patients.len() as i64, page))
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn upsert(&self, incident: &QuarantineIncident) -> Result<QuarantineIncident, StoreError> {
        // Lock order: patients before incidents
        let patients = self.patients.read().await;
        if !patients.contains_key(&incident.patient_id) {
            return Err(StoreError::NotFound {
                resource: "patient",
                id: incident.patient_id.clone(),
            });
        }
        self.incidents
            .write()
            .await
            .insert(incident.id, incident.clone());
        Ok(incident.clone())
    }

    async fn list_all(&self) -> Result<Vec<QuarantineIncident>, StoreError> {
        let mut incidents: Vec<_> = self.incidents.read().await.values().cloned().collect();
        incidents.sort_by(|a, b| (a.event_date, a.id).cmp(&(b.event_date, b.id)));
        Ok(incidents)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.incidents.read().await.len() as i64)
    }
}
