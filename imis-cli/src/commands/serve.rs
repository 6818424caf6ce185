//! HTTP server command
//!
//! Flags override environment variables, which override the config file.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use imis_core::{ImisConfig, SelectionKind, StorageBackend};
use imis_server::db::{create_pool_with_options, migrations};
use imis_server::http::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: [server] bind, else 127.0.0.1:8080)
    #[arg(long, short = 'b', env = "IMIS_BIND")]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Keep everything in process memory; nothing survives a restart
    #[arg(long)]
    pub in_memory: bool,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Quarantine selection policy: active, all or pending
    #[arg(long, value_name = "POLICY")]
    pub selection: Option<SelectionKind>,
}

/// Storage choice after applying flags over config.
fn backend(args: &ServeArgs, config: &ImisConfig) -> StorageBackend {
    if args.in_memory {
        StorageBackend::Memory
    } else {
        config.storage.backend
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: &ImisConfig) -> Result<()> {
    let selection = args.selection.unwrap_or(config.quarantine.selection);
    let server = ServerConfig {
        bind_addr: args.bind.unwrap_or(config.server.bind),
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
    };

    let backend = backend(&args, config);
    let state = match backend {
        StorageBackend::Memory => {
            tracing::warn!("In-memory storage: data is lost on shutdown");
            AppState::in_memory(selection.policy())
        }
        StorageBackend::Postgres => {
            let database_url = args
                .database_url
                .or_else(|| config.database_url())
                .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or [database] url in ~/.imis/config.toml")?;

            let pool = create_pool_with_options(&database_url, config.database.max_connections)
                .await
                .context("Failed to create database pool")?;
            migrations::run(&pool)
                .await
                .context("Failed to bootstrap database schema")?;
            AppState::postgres(pool, selection.policy())
        }
    };

    tracing::info!(
        bind = %server.bind_addr,
        backend = ?backend,
        selection = %selection,
        "Starting IMIS server"
    );

    // Run server (blocks until shutdown)
    run_server(state, server).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(in_memory: bool) -> ServeArgs {
        ServeArgs {
            bind: None,
            database_url: None,
            in_memory,
            cors_permissive: false,
            selection: None,
        }
    }

    #[test]
    fn in_memory_flag_overrides_config() {
        let config = ImisConfig::default();
        assert_eq!(backend(&args(false), &config), StorageBackend::Postgres);
        assert_eq!(backend(&args(true), &config), StorageBackend::Memory);
    }

    #[test]
    fn config_backend_used_without_flag() {
        let mut config = ImisConfig::default();
        config.storage.backend = StorageBackend::Memory;
        assert_eq!(backend(&args(false), &config), StorageBackend::Memory);
    }
}
