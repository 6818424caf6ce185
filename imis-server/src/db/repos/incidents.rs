//! Quarantine incident repository
//!
//! Upsert is a single `INSERT ... ON CONFLICT (id) DO UPDATE`, so concurrent
//! saves of the same id never race into a duplicate row. A missing patient
//! surfaces as a foreign key violation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use imis_core::QuarantineIncident;
use once_cell::sync::Lazy;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::classify;
use crate::db::schema::QUARANTINE_INCIDENTS;
use crate::store::{IncidentStore, StoreError};

static UPSERT_INCIDENT: Lazy<String> = Lazy::new(|| {
    format!(
        "{} ON CONFLICT (id) DO UPDATE SET {} RETURNING {}",
        QUARANTINE_INCIDENTS.insert_sql(),
        QUARANTINE_INCIDENTS.excluded_assignments("id"),
        QUARANTINE_INCIDENTS.column_list()
    )
});

static LIST_INCIDENTS: Lazy<String> =
    Lazy::new(|| format!("{} ORDER BY event_date, id", QUARANTINE_INCIDENTS.select_sql()));

/// Incident record from database
#[derive(Debug, Clone, FromRow)]
struct IncidentRow {
    id: Uuid,
    patient_id: String,
    event_date: NaiveDate,
    #[sqlx(rename = "until_date")]
    until: Option<NaiveDate>,
    comment: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<IncidentRow> for QuarantineIncident {
    fn from(row: IncidentRow) -> Self {
        Self {
            id: row.id,
            patient_id: row.patient_id,
            event_date: row.event_date,
            until: row.until,
            comment: row.comment,
            updated_at: row.updated_at,
        }
    }
}

/// Incident repository
#[derive(Clone)]
pub struct IncidentRepo {
    pool: PgPool,
}

impl IncidentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentStore for IncidentRepo {
    async fn upsert(&self, incident: &QuarantineIncident) -> Result<QuarantineIncident, StoreError> {
        let row: IncidentRow = sqlx::query_as(&UPSERT_INCIDENT)
            .bind(incident.id)
            .bind(&incident.patient_id)
            .bind(incident.event_date)
            .bind(incident.until)
            .bind(&incident.comment)
            .bind(incident.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "patient", &incident.patient_id))?;

        tracing::debug!(incident_id = %row.id, patient_id = %row.patient_id, "incident saved");
        Ok(row.into())
    }

    async fn list_all(&self) -> Result<Vec<QuarantineIncident>, StoreError> {
        let rows: Vec<IncidentRow> = sqlx::query_as(&LIST_INCIDENTS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quarantine_incidents")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.0)
    }
}
