//! Command implementations for the imis CLI

pub mod config;
pub mod migrate;
pub mod serve;

// Re-export dispatcher functions for flat access from main.rs
pub use config::run_config;
pub use migrate::run_migrate;
pub use serve::run_serve;
