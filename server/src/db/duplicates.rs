//! Duplicate-registration detection.
//!
//! Two records collide when every component of their identity tuple is equal
//! after normalization: surrounding whitespace trimmed, inner runs of
//! whitespace collapsed, letters lowercased, control characters dropped.
//! Missing and blank values are equal to each other.
//!
//! The normalized tuple is stored with each row as `identity_key`, so a
//! check is a single indexed lookup.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::StoreError;
use crate::models::{Patient, PatientFields, PatientInNeed, PatientInNeedFields};

const SEPARATOR: &str = "\u{1f}";

pub fn normalize(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

/// Normalized identity tuple of a record, encoded as one string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    fn from_parts(parts: &[String]) -> Self {
        Self(parts.join(SEPARATOR))
    }

    /// Identity of a patient: (name, phone, address, dob, gender, age)
    pub fn patient(fields: &PatientFields) -> Self {
        Self::from_parts(&[
            normalize(Some(fields.name.as_str())),
            normalize(fields.phone_number.as_deref()),
            normalize(fields.address.as_deref()),
            normalize_date(fields.dob),
            normalize(fields.gender.as_deref()),
            fields.age.map(|a| a.to_string()).unwrap_or_default(),
        ])
    }

    /// Identity of an intake registration:
    /// (patient_name, contact_name, contact_email, contact_phone_number)
    pub fn patient_in_need(fields: &PatientInNeedFields) -> Self {
        Self::from_parts(&[
            normalize(Some(fields.patient_name.as_str())),
            normalize(Some(fields.contact_name.as_str())),
            normalize(fields.contact_email.as_deref()),
            normalize(fields.contact_phone_number.as_deref()),
        ])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether another patient already carries the identity of `fields`.
///
/// `exclude` skips one id, so an update never collides with itself.
pub async fn patient_exists(
    conn: &mut SqliteConnection,
    fields: &PatientFields,
    exclude: Option<Uuid>,
) -> Result<bool, StoreError> {
    let key = IdentityKey::patient(fields);
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM patients WHERE identity_key = ? AND id IS NOT ? LIMIT 1",
    )
    .bind(key.as_str())
    .bind(exclude)
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

/// Whether another intake registration already carries the identity of `fields`
pub async fn patient_in_need_exists(
    conn: &mut SqliteConnection,
    fields: &PatientInNeedFields,
    exclude: Option<Uuid>,
) -> Result<bool, StoreError> {
    let key = IdentityKey::patient_in_need(fields);
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM patients_in_need WHERE identity_key = ? AND id IS NOT ? LIMIT 1",
    )
    .bind(key.as_str())
    .bind(exclude)
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

/// Compute `identity_key` for rows stored without one. Returns the number of
/// rows filled in.
pub async fn backfill_identity_keys(conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let patients = sqlx::query_as::<_, Patient>(
        "SELECT id, name, dob, age, gender, address, phone_number,
                initial_treatment_date, doctor, caregiver
         FROM patients WHERE identity_key IS NULL",
    )
    .fetch_all(&mut *conn)
    .await?;
    for patient in &patients {
        sqlx::query("UPDATE patients SET identity_key = ? WHERE id = ?")
            .bind(IdentityKey::patient(&patient.fields).as_str())
            .bind(patient.id)
            .execute(&mut *conn)
            .await?;
    }

    let registrations = sqlx::query_as::<_, PatientInNeed>(
        "SELECT id, patient_name, contact_name, contact_email, contact_phone_number,
                address, health_condition, care_details, registered_at
         FROM patients_in_need WHERE identity_key IS NULL",
    )
    .fetch_all(&mut *conn)
    .await?;
    for registration in &registrations {
        sqlx::query("UPDATE patients_in_need SET identity_key = ? WHERE id = ?")
            .bind(IdentityKey::patient_in_need(&registration.fields).as_str())
            .bind(registration.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok((patients.len() + registrations.len()) as u64)
}
