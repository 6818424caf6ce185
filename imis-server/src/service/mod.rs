//! Business façades over the stores
//!
//! Services own validation, id generation and the quarantine selection
//! policy. Handlers only translate HTTP to service calls and back.

pub mod incidents;
pub mod patients;

use imis_core::ValidationError;

use crate::store::StoreError;

pub use incidents::QuarantineIncidentService;
pub use patients::PatientService;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },

    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            StoreError::Conflict { resource, id } => Self::Conflict { resource, id },
            other => Self::Store(other),
        }
    }
}
