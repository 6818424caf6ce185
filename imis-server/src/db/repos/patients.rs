//! Patient repository
//!
//! - insert: patient row + events in one transaction; duplicate id -> Conflict
//! - get/list: events batch-loaded with `= ANY($1)` (no N+1)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use imis_core::{string_list, Paginated, Pagination, Patient, PatientEvent, RiskOccupation};
use once_cell::sync::Lazy;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::classify;
use crate::db::schema::{PATIENTS, PATIENT_EVENTS};
use crate::store::{PatientStore, StoreError};

static SELECT_PATIENT: Lazy<String> = Lazy::new(|| format!("{} WHERE id = $1", PATIENTS.select_sql()));

static SELECT_PATIENTS_BY_ID: Lazy<String> =
    Lazy::new(|| format!("{} WHERE id = ANY($1)", PATIENTS.select_sql()));

static LIST_PATIENTS: Lazy<String> = Lazy::new(|| {
    format!(
        "{} ORDER BY last_name, first_name, id LIMIT $1 OFFSET $2",
        PATIENTS.select_sql()
    )
});

static SELECT_EVENTS: Lazy<String> = Lazy::new(|| {
    format!(
        "{} WHERE patient_id = ANY($1) ORDER BY event_timestamp, id",
        PATIENT_EVENTS.select_sql()
    )
});

/// Patient record from database
#[derive(Debug, Clone, FromRow)]
struct PatientRow {
    id: String,
    last_name: String,
    first_name: String,
    gender: String,
    date_of_birth: NaiveDate,
    email: Option<String>,
    phone_number: Option<String>,
    street: Option<String>,
    house_number: Option<String>,
    zip: Option<i32>,
    city: Option<String>,
    insurance_company: Option<String>,
    insurance_membership_number: Option<String>,
    confirmed: bool,
    flu_immunization: Option<bool>,
    speed_of_symptoms_outbreak: Option<String>,
    symptoms: Option<String>,
    corona_contacts: Option<bool>,
    risk_areas: Option<String>,
    weakened_immune_system: Option<bool>,
    pre_illnesses: Option<String>,
    risk_occupation: Option<String>,
    comment: Option<String>,
    occupation: Option<String>,
}

impl PatientRow {
    fn into_patient(self, events: Vec<PatientEvent>) -> Result<Patient, StoreError> {
        let risk_occupation = self
            .risk_occupation
            .as_deref()
            .map(str::parse::<RiskOccupation>)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("patient '{}': {}", self.id, e)))?;

        Ok(Patient {
            symptoms: string_list::decode(self.symptoms.as_deref()),
            risk_areas: string_list::decode(self.risk_areas.as_deref()),
            pre_illnesses: string_list::decode(self.pre_illnesses.as_deref()),
            risk_occupation,
            id: self.id,
            last_name: self.last_name,
            first_name: self.first_name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            email: self.email,
            phone_number: self.phone_number,
            street: self.street,
            house_number: self.house_number,
            zip: self.zip,
            city: self.city,
            insurance_company: self.insurance_company,
            insurance_membership_number: self.insurance_membership_number,
            confirmed: self.confirmed,
            flu_immunization: self.flu_immunization,
            speed_of_symptoms_outbreak: self.speed_of_symptoms_outbreak,
            corona_contacts: self.corona_contacts,
            weakened_immune_system: self.weakened_immune_system,
            comment: self.comment,
            occupation: self.occupation,
            events,
        })
    }
}

/// Patient event record from database
#[derive(Debug, Clone, FromRow)]
struct PatientEventRow {
    id: Uuid,
    patient_id: String,
    event_type: String,
    event_timestamp: DateTime<Utc>,
    comment: Option<String>,
}

impl TryFrom<PatientEventRow> for PatientEvent {
    type Error = StoreError;

    fn try_from(row: PatientEventRow) -> Result<Self, Self::Error> {
        let event_type = row
            .event_type
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("event '{}': {}", row.id, e)))?;
        Ok(Self {
            id: row.id,
            patient_id: row.patient_id,
            event_type,
            event_timestamp: row.event_timestamp,
            comment: row.comment,
        })
    }
}

/// Patient repository
#[derive(Clone)]
pub struct PatientRepo {
    pool: PgPool,
}

impl PatientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Events for the given patients, grouped by patient id.
    async fn events_for(&self, ids: &[String]) -> Result<HashMap<String, Vec<PatientEvent>>, StoreError> {
        let rows: Vec<PatientEventRow> = sqlx::query_as(&SELECT_EVENTS)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<String, Vec<PatientEvent>> = HashMap::new();
        for row in rows {
            let event = PatientEvent::try_from(row)?;
            grouped.entry(event.patient_id.clone()).or_default().push(event);
        }
        Ok(grouped)
    }

    async fn attach_events(&self, rows: Vec<PatientRow>) -> Result<Vec<Patient>, StoreError> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut events = self.events_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let owned = events.remove(&row.id).unwrap_or_default();
                row.into_patient(owned)
            })
            .collect()
    }
}

#[async_trait]
impl PatientStore for PatientRepo {
    async fn insert(&self, patient: &Patient) -> Result<Patient, StoreError> {
        let mut tx = self.pool.begin().await?;

        let insert_patient = PATIENTS.insert_sql();
        sqlx::query(&insert_patient)
            .bind(&patient.id)
            .bind(&patient.last_name)
            .bind(&patient.first_name)
            .bind(&patient.gender)
            .bind(patient.date_of_birth)
            .bind(&patient.email)
            .bind(&patient.phone_number)
            .bind(&patient.street)
            .bind(&patient.house_number)
            .bind(patient.zip)
            .bind(&patient.city)
            .bind(&patient.insurance_company)
            .bind(&patient.insurance_membership_number)
            .bind(patient.confirmed)
            .bind(patient.flu_immunization)
            .bind(&patient.speed_of_symptoms_outbreak)
            .bind(string_list::encode(&patient.symptoms))
            .bind(patient.corona_contacts)
            .bind(string_list::encode(&patient.risk_areas))
            .bind(patient.weakened_immune_system)
            .bind(string_list::encode(&patient.pre_illnesses))
            .bind(patient.risk_occupation.map(|o| o.as_str()))
            .bind(&patient.comment)
            .bind(&patient.occupation)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, "patient", &patient.id))?;

        let insert_event = PATIENT_EVENTS.insert_sql();
        for event in &patient.events {
            sqlx::query(&insert_event)
                .bind(event.id)
                .bind(&event.patient_id)
                .bind(event.event_type.as_str())
                .bind(event.event_timestamp)
                .bind(&event.comment)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(patient_id = %patient.id, events = patient.events.len(), "patient inserted");
        Ok(patient.clone())
    }

    async fn get(&self, id: &str) -> Result<Patient, StoreError> {
        let row: PatientRow = sqlx::query_as(&SELECT_PATIENT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                resource: "patient",
                id: id.to_owned(),
            })?;

        let mut patients = self.attach_events(vec![row]).await?;
        patients.pop().ok_or_else(|| StoreError::NotFound {
            resource: "patient",
            id: id.to_owned(),
        })
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Patient>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<PatientRow> = sqlx::query_as(&SELECT_PATIENTS_BY_ID)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        self.attach_events(rows).await
    }

    async fn list(&self, page: Pagination) -> Result<Paginated<Patient>, StoreError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM patients")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<PatientRow> = sqlx::query_as(&LIST_PATIENTS)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = self.attach_events(rows).await?;
        Ok(Paginated::new(items, total.0, page))
    }
}
