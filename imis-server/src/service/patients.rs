//! Patient registration and lookup

use std::sync::Arc;

use chrono::Utc;
use imis_core::{CreatePatientDto, Paginated, Pagination, Patient, PatientId};

use super::ServiceError;
use crate::store::PatientStore;

/// Patient operations
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn PatientStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    /// Validate, assign an id, record the registration event and persist.
    pub async fn add_patient(&self, dto: CreatePatientDto) -> Result<Patient, ServiceError> {
        let patient = dto.into_patient(PatientId::generate, Utc::now())?;
        let saved = self.store.insert(&patient).await?;
        tracing::info!(patient_id = %saved.id, "patient registered");
        Ok(saved)
    }

    /// Exact-id lookup; no normalization.
    pub async fn find_patient_by_id(&self, id: &str) -> Result<Patient, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list_patients(&self, page: Pagination) -> Result<Paginated<Patient>, ServiceError> {
        Ok(self.store.list(page).await?)
    }
}
