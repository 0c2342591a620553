use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identifying and care attributes of a patient, as submitted and as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PatientFields {
    #[serde(default)]
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub initial_treatment_date: Option<NaiveDate>,
    pub doctor: Option<String>,
    pub caregiver: Option<String>,
}

/// Stored patient row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: PatientFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatusInput {
    pub disease: Option<String>,
    pub medication: Option<String>,
    pub note: Option<String>,
    pub note_date: Option<NaiveDate>,
}

/// Health status with its note log rendered newest-first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusEntry {
    pub id: i64,
    pub patient_id: Uuid,
    pub disease: Option<String>,
    pub medication: Option<String>,
    pub note: String,
    pub note_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalProxyInput {
    pub name: Option<String>,
    pub relation: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MedicalProxy {
    pub patient_id: Uuid,
    pub name: Option<String>,
    pub relation: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalHistoryLog {
    pub patient_id: Uuid,
    pub history: String,
}

/// Body of `POST /api/patients` and `PUT /api/patients/:id`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientInput {
    #[serde(flatten)]
    pub patient: PatientFields,
    #[serde(default)]
    pub health_status: Option<HealthStatusInput>,
    #[serde(default)]
    pub medical_proxy: Option<MedicalProxyInput>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

/// A patient joined with every dependent record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub patient: Patient,
    #[serde(rename = "healthStatus")]
    pub health_status: Vec<HealthStatusEntry>,
    #[serde(rename = "medicalProxy")]
    pub medical_proxy: Option<MedicalProxy>,
    #[serde(rename = "medicalHistory")]
    pub medical_history: Option<MedicalHistoryLog>,
}
