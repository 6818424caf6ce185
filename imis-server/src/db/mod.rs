//! Database layer - connection pool, schema and repositories
//!
//! - Connection pool, no Arc<Mutex<Connection>>
//! - List operations batch-load events, no N+1 queries
//! - Rely on DB constraints and map their violations, no check-then-insert
//! - Transactions for multi-row writes

pub mod migrations;
pub mod pool;
pub mod repos;
pub mod schema;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::{IncidentRepo, PatientRepo};
