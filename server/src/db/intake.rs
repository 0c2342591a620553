use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use super::duplicates::{self, IdentityKey};
use super::{StoreError, UnitOfWork};
use crate::models::{PatientInNeed, PatientInNeedFields};

const COLUMNS: &str = "id, patient_name, contact_name, contact_email, contact_phone_number,
    address, health_condition, care_details, registered_at";

/// Intake registrations submitted before a person becomes a managed patient
pub struct PatientInNeedRepository {
    pool: Arc<SqlitePool>,
}

impl PatientInNeedRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, fields: PatientInNeedFields) -> Result<Uuid, StoreError> {
        validate(&fields)?;

        let mut uow = UnitOfWork::begin(&self.pool, "patient_in_need.create").await?;
        if duplicates::patient_in_need_exists(uow.conn(), &fields, None).await? {
            uow.rollback().await?;
            tracing::warn!(patient_name = %fields.patient_name, "Duplicate intake registration rejected");
            return Err(duplicate_registration());
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO patients_in_need (id, patient_name, contact_name, contact_email,
                contact_phone_number, address, health_condition, care_details, registered_at,
                identity_key)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(fields.patient_name.trim())
        .bind(fields.contact_name.trim())
        .bind(&fields.contact_email)
        .bind(&fields.contact_phone_number)
        .bind(&fields.address)
        .bind(&fields.health_condition)
        .bind(&fields.care_details)
        .bind(Utc::now())
        .bind(IdentityKey::patient_in_need(&fields).as_str())
        .execute(uow.conn())
        .await?;

        uow.commit().await?;
        tracing::info!(id = %id, "Patient in need registered");
        Ok(id)
    }

    pub async fn list(&self) -> Result<Vec<PatientInNeed>, StoreError> {
        let rows = sqlx::query_as::<_, PatientInNeed>(&format!(
            "SELECT {COLUMNS} FROM patients_in_need ORDER BY registered_at DESC"
        ))
        .fetch_all(&*self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<PatientInNeed, StoreError> {
        sqlx::query_as::<_, PatientInNeed>(&format!(
            "SELECT {COLUMNS} FROM patients_in_need WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Patient in need", id))
    }

    /// Overwrite a registration; the duplicate check skips the record itself
    pub async fn update(
        &self,
        id: Uuid,
        fields: PatientInNeedFields,
    ) -> Result<PatientInNeed, StoreError> {
        validate(&fields)?;

        let mut uow = UnitOfWork::begin(&self.pool, "patient_in_need.update").await?;
        if duplicates::patient_in_need_exists(uow.conn(), &fields, Some(id)).await? {
            uow.rollback().await?;
            return Err(duplicate_registration());
        }

        let updated = sqlx::query_as::<_, PatientInNeed>(&format!(
            "UPDATE patients_in_need
             SET patient_name = ?, contact_name = ?, contact_email = ?, contact_phone_number = ?,
                 address = ?, health_condition = ?, care_details = ?, identity_key = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(fields.patient_name.trim())
        .bind(fields.contact_name.trim())
        .bind(&fields.contact_email)
        .bind(&fields.contact_phone_number)
        .bind(&fields.address)
        .bind(&fields.health_condition)
        .bind(&fields.care_details)
        .bind(IdentityKey::patient_in_need(&fields).as_str())
        .bind(id)
        .fetch_optional(uow.conn())
        .await?
        .ok_or_else(|| StoreError::not_found("Patient in need", id))?;

        uow.commit().await?;
        tracing::info!(id = %id, "Patient in need updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let removed = sqlx::query("DELETE FROM patients_in_need WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(StoreError::not_found("Patient in need", id));
        }
        tracing::info!(id = %id, "Patient in need deleted");
        Ok(())
    }
}

fn validate(fields: &PatientInNeedFields) -> Result<(), StoreError> {
    if fields.patient_name.trim().is_empty() {
        return Err(StoreError::InvalidInput("patient_name is required".into()));
    }
    if fields.contact_name.trim().is_empty() {
        return Err(StoreError::InvalidInput("contact_name is required".into()));
    }
    Ok(())
}

fn duplicate_registration() -> StoreError {
    StoreError::Conflict("This patient in need has already been registered".into())
}
