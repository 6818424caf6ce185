//! Storage seams
//!
//! Services talk to these traits; `db::repos` implements them on Postgres and
//! [`MemoryStore`] implements them in process.

pub mod memory;

use async_trait::async_trait;
use imis_core::{Paginated, Pagination, Patient, QuarantineIncident};

pub use memory::MemoryStore;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Patient persistence
#[async_trait]
pub trait PatientStore: Send + Sync + 'static {
    /// Insert a new patient together with its events.
    ///
    /// Fails with [`StoreError::Conflict`] when the id is taken.
    async fn insert(&self, patient: &Patient) -> Result<Patient, StoreError>;

    /// Patient by exact id, with events.
    async fn get(&self, id: &str) -> Result<Patient, StoreError>;

    /// Patients for the given ids; unknown ids are skipped.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Patient>, StoreError>;

    /// Patients ordered by last name, first name, id.
    async fn list(&self, page: Pagination) -> Result<Paginated<Patient>, StoreError>;
}

/// Quarantine incident persistence
#[async_trait]
pub trait IncidentStore: Send + Sync + 'static {
    /// Insert or replace by id.
    ///
    /// Fails with [`StoreError::NotFound`] when the referenced patient is missing.
    async fn upsert(&self, incident: &QuarantineIncident) -> Result<QuarantineIncident, StoreError>;

    /// Every incident, ordered by event date then id.
    async fn list_all(&self) -> Result<Vec<QuarantineIncident>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}
