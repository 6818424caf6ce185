//! Schema bootstrap command

use anyhow::{Context, Result};
use clap::Parser;
use imis_core::ImisConfig;
use imis_server::db::{create_pool, migrations};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config: &ImisConfig) -> Result<()> {
    let database_url = args
        .database_url
        .or_else(|| config.database_url())
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or [database] url in ~/.imis/config.toml")?;

    let pool = create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool).await.context("Migration failed")?;

    println!("Schema is up to date");
    Ok(())
}
