use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Public intake registration for a person not yet managed as a patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PatientInNeedFields {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone_number: Option<String>,
    pub address: Option<String>,
    pub health_condition: Option<String>,
    pub care_details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PatientInNeed {
    pub id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub fields: PatientInNeedFields,
    pub registered_at: DateTime<Utc>,
}
