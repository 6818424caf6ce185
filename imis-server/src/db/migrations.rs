//! Schema bootstrap

use sqlx::PgPool;

use super::schema::{INDEXES, TABLES};

/// Create all tables and indexes (idempotent)
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running IMIS migrations...");

    let mut tx = pool.begin().await?;
    for table in TABLES {
        tracing::debug!(table = table.name, "ensuring table");
        sqlx::query(&table.create_sql()).execute(&mut *tx).await?;
    }
    for index in INDEXES {
        sqlx::query(index).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("IMIS migrations complete");
    Ok(())
}
