//! Postgres implementations of the storage traits

pub mod incidents;
pub mod patients;

pub use incidents::IncidentRepo;
pub use patients::PatientRepo;

use crate::store::StoreError;

/// Map constraint violations onto store errors.
pub(crate) fn classify(err: sqlx::Error, resource: &'static str, id: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict {
                resource,
                id: id.to_owned(),
            };
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound {
                resource,
                id: id.to_owned(),
            };
        }
    }
    StoreError::Sqlx(err)
}
