//! imis-server: HTTP backend for patient registration and quarantine incidents
//!
//! Layers, outermost first:
//! - `http`: axum router, extractors, error mapping
//! - `service`: validation, id assignment, quarantine selection
//! - `store`: storage traits plus the in-memory implementation
//! - `db`: Postgres pool, schema bootstrap and repositories

pub mod db;
pub mod http;
pub mod service;
pub mod store;

pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use service::{PatientService, QuarantineIncidentService, ServiceError};
pub use store::{IncidentStore, MemoryStore, PatientStore, StoreError};
