use chrono::{Local, NaiveDate};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use super::duplicates::{self, IdentityKey};
use super::history::{self, LogOwner};
use super::{StoreError, UnitOfWork};
use crate::models::{
    HealthStatusEntry, HealthStatusInput, MedicalHistoryLog, MedicalProxy, MedicalProxyInput,
    Patient, PatientFields, PatientInput, PatientRecord,
};

const PATIENT_COLUMNS: &str = "id, name, dob, age, gender, address, phone_number,
    initial_treatment_date, doctor, caregiver";

/// Removal of a patient and everything it owns, children before parent.
/// Active assignments are closed rather than removed.
const DELETE_CASCADE: &[&str] = &[
    "DELETE FROM health_status_notes
     WHERE health_status_id IN (SELECT id FROM health_status WHERE patient_id = ?)",
    "DELETE FROM health_status WHERE patient_id = ?",
    "DELETE FROM medical_proxies WHERE patient_id = ?",
    "DELETE FROM medical_history_entries WHERE patient_id = ?",
    "UPDATE assignments SET status = 'inactive' WHERE patient_id = ? AND status = 'active'",
];

#[derive(Debug, FromRow)]
struct HealthStatusRow {
    id: i64,
    patient_id: Uuid,
    disease: Option<String>,
    medication: Option<String>,
    note_date: Option<NaiveDate>,
}

/// Patient records and their health status, proxy and medical history
pub struct PatientRepository {
    pool: Arc<SqlitePool>,
}

impl PatientRepository {
    /// Create new repository instance
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Register a patient with its optional dependent records.
    ///
    /// Fails with `Conflict` and writes nothing when a patient with the same
    /// identity already exists.
    pub async fn create(&self, input: PatientInput) -> Result<Uuid, StoreError> {
        validate(&input.patient)?;

        let mut uow = UnitOfWork::begin(&self.pool, "patient.create").await?;
        if duplicates::patient_exists(uow.conn(), &input.patient, None).await? {
            uow.rollback().await?;
            tracing::warn!(name = %input.patient.name, "Duplicate patient registration rejected");
            return Err(duplicate_patient());
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO patients (id, name, dob, age, gender, address, phone_number,
                                   initial_treatment_date, doctor, caregiver, identity_key)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(input.patient.name.trim())
        .bind(input.patient.dob)
        .bind(input.patient.age)
        .bind(&input.patient.gender)
        .bind(&input.patient.address)
        .bind(&input.patient.phone_number)
        .bind(input.patient.initial_treatment_date)
        .bind(&input.patient.doctor)
        .bind(&input.patient.caregiver)
        .bind(IdentityKey::patient(&input.patient).as_str())
        .execute(uow.conn())
        .await?;

        if let Some(status) = &input.health_status {
            let status_id = insert_health_status(uow.conn(), id, status, status.note_date).await?;
            if let Some(note) = non_blank(status.note.as_deref()) {
                history::append(uow.conn(), LogOwner::HealthStatus(status_id), None, note).await?;
            }
        }

        if let Some(proxy) = &input.medical_proxy {
            upsert_proxy(uow.conn(), id, proxy).await?;
        }

        if let Some(text) = non_blank(input.medical_history.as_deref()) {
            history::append(uow.conn(), LogOwner::MedicalHistory(id), None, text).await?;
        }

        uow.commit().await?;
        tracing::info!(patient_id = %id, "Patient created");
        Ok(id)
    }

    /// Overwrite a patient's fields and append to its logs.
    ///
    /// Scalar fields are last-write-wins. A supplied health status overwrites
    /// disease and medication, appends its note, and records the change in the
    /// medical history; supplied history text is appended after that.
    pub async fn update(&self, id: Uuid, input: PatientInput) -> Result<(), StoreError> {
        validate(&input.patient)?;

        let mut uow = UnitOfWork::begin(&self.pool, "patient.update").await?;
        ensure_patient(uow.conn(), id).await?;

        if duplicates::patient_exists(uow.conn(), &input.patient, Some(id)).await? {
            uow.rollback().await?;
            tracing::warn!(patient_id = %id, "Patient update collides with another patient");
            return Err(duplicate_patient());
        }

        sqlx::query(
            "UPDATE patients
             SET name = ?, dob = ?, age = ?, gender = ?, address = ?, phone_number = ?,
                 initial_treatment_date = ?, doctor = ?, caregiver = ?, identity_key = ?
             WHERE id = ?",
        )
        .bind(input.patient.name.trim())
        .bind(input.patient.dob)
        .bind(input.patient.age)
        .bind(&input.patient.gender)
        .bind(&input.patient.address)
        .bind(&input.patient.phone_number)
        .bind(input.patient.initial_treatment_date)
        .bind(&input.patient.doctor)
        .bind(&input.patient.caregiver)
        .bind(IdentityKey::patient(&input.patient).as_str())
        .bind(id)
        .execute(uow.conn())
        .await?;

        let today = Local::now().date_naive();

        if let Some(status) = &input.health_status {
            let stamp = status.note_date.unwrap_or(today);
            let note = non_blank(status.note.as_deref());
            let note_date = note.map(|_| stamp).or(status.note_date);

            let status_id = match latest_health_status(uow.conn(), id).await? {
                Some(status_id) => {
                    sqlx::query(
                        "UPDATE health_status
                         SET disease = ?, medication = ?, note_date = COALESCE(?, note_date)
                         WHERE id = ?",
                    )
                    .bind(&status.disease)
                    .bind(&status.medication)
                    .bind(note_date)
                    .bind(status_id)
                    .execute(uow.conn())
                    .await?;
                    status_id
                }
                None => insert_health_status(uow.conn(), id, status, note_date).await?,
            };

            if let Some(note) = note {
                history::append(uow.conn(), LogOwner::HealthStatus(status_id), Some(stamp), note)
                    .await?;
            }

            let summary = status_change_summary(status);
            history::append(uow.conn(), LogOwner::MedicalHistory(id), Some(stamp), &summary)
                .await?;
        }

        if let Some(proxy) = &input.medical_proxy {
            upsert_proxy(uow.conn(), id, proxy).await?;
        }

        if let Some(text) = non_blank(input.medical_history.as_deref()) {
            history::append(uow.conn(), LogOwner::MedicalHistory(id), Some(today), text).await?;
        }

        uow.commit().await?;
        tracing::info!(patient_id = %id, "Patient updated");
        Ok(())
    }

    /// Delete a patient together with its health status, proxy and history
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut uow = UnitOfWork::begin(&self.pool, "patient.delete").await?;
        ensure_patient(uow.conn(), id).await?;

        for &statement in DELETE_CASCADE {
            sqlx::query(statement).bind(id).execute(uow.conn()).await?;
        }

        let removed = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(uow.conn())
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(StoreError::not_found("Patient", id));
        }

        uow.commit().await?;
        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(())
    }

    /// Get a patient with every dependent record
    pub async fn get(&self, id: Uuid) -> Result<PatientRecord, StoreError> {
        let mut uow = UnitOfWork::read(&self.pool, "patient.get").await?;

        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(uow.conn())
        .await?
        .ok_or_else(|| StoreError::not_found("Patient", id))?;

        let rows = sqlx::query_as::<_, HealthStatusRow>(
            "SELECT id, patient_id, disease, medication, note_date
             FROM health_status WHERE patient_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(uow.conn())
        .await?;

        let mut health_status = Vec::with_capacity(rows.len());
        for row in rows {
            let notes = history::load(uow.conn(), LogOwner::HealthStatus(row.id)).await?;
            health_status.push(HealthStatusEntry {
                id: row.id,
                patient_id: row.patient_id,
                disease: row.disease,
                medication: row.medication,
                note: history::render(&notes),
                note_date: row.note_date,
            });
        }

        let medical_proxy = sqlx::query_as::<_, MedicalProxy>(
            "SELECT patient_id, name, relation, phone_number
             FROM medical_proxies WHERE patient_id = ?",
        )
        .bind(id)
        .fetch_optional(uow.conn())
        .await?;

        let entries = history::load(uow.conn(), LogOwner::MedicalHistory(id)).await?;
        let medical_history = (!entries.is_empty()).then(|| MedicalHistoryLog {
            patient_id: id,
            history: history::render(&entries),
        });

        uow.commit().await?;

        Ok(PatientRecord {
            patient,
            health_status,
            medical_proxy,
            medical_history,
        })
    }

    /// All patients, ordered by name
    pub async fn list(&self) -> Result<Vec<Patient>, StoreError> {
        let patients = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name COLLATE NOCASE, id"
        ))
        .fetch_all(&*self.pool)
        .await?;
        Ok(patients)
    }
}

fn validate(fields: &PatientFields) -> Result<(), StoreError> {
    if fields.name.trim().is_empty() {
        return Err(StoreError::InvalidInput("patient name is required".into()));
    }
    Ok(())
}

fn duplicate_patient() -> StoreError {
    StoreError::Conflict("A patient with the same details already exists".into())
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn status_change_summary(status: &HealthStatusInput) -> String {
    format!(
        "Health status updated. Disease: {}, Medication: {}",
        status.disease.as_deref().unwrap_or("-"),
        status.medication.as_deref().unwrap_or("-")
    )
}

async fn ensure_patient(conn: &mut SqliteConnection, id: Uuid) -> Result<(), StoreError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM patients WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::not_found("Patient", id)),
    }
}

async fn insert_health_status(
    conn: &mut SqliteConnection,
    patient_id: Uuid,
    status: &HealthStatusInput,
    note_date: Option<NaiveDate>,
) -> Result<i64, StoreError> {
    let id = sqlx::query(
        "INSERT INTO health_status (patient_id, disease, medication, note_date)
         VALUES (?, ?, ?, ?)",
    )
    .bind(patient_id)
    .bind(&status.disease)
    .bind(&status.medication)
    .bind(note_date)
    .execute(conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn latest_health_status(
    conn: &mut SqliteConnection,
    patient_id: Uuid,
) -> Result<Option<i64>, StoreError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM health_status WHERE patient_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(patient_id)
    .fetch_optional(conn)
    .await?;
    Ok(id)
}

async fn upsert_proxy(
    conn: &mut SqliteConnection,
    patient_id: Uuid,
    proxy: &MedicalProxyInput,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO medical_proxies (patient_id, name, relation, phone_number)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(patient_id) DO UPDATE
         SET name = excluded.name, relation = excluded.relation,
             phone_number = excluded.phone_number",
    )
    .bind(patient_id)
    .bind(&proxy.name)
    .bind(&proxy.relation)
    .bind(&proxy.phone_number)
    .execute(conn)
    .await?;
    Ok(())
}
