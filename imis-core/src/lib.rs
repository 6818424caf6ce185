//! imis-core: domain model for patient and quarantine incident tracking
//!
//! Entities, creation payloads, validation, the list column codec, quarantine
//! selection policies, identity-preserving JSON encoding and configuration.

pub mod config;
pub mod event;
pub mod graph;
pub mod incident;
pub mod pagination;
pub mod patient;
pub mod policy;
pub mod string_list;
pub mod validation;

pub use config::{ImisConfig, StorageBackend};
pub use event::{PatientEvent, PatientStatus};
pub use graph::GraphEncoder;
pub use incident::{IncidentBatch, PatientRef, QuarantineIncident, QuarantineIncidentInput};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use patient::{CreatePatientDto, Patient, PatientId, RiskOccupation};
pub use policy::{ActiveQuarantine, AllIncidents, PendingDecision, QuarantinePolicy, SelectionKind};
pub use validation::ValidationError;
