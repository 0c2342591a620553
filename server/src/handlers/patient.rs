use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiPath};
use crate::db::PatientRepository;
use crate::models::{MessageBody, Patient, PatientInput, PatientRecord};
use crate::AppState;

/// POST /api/patients
/// Register a patient with optional health status, proxy and history
pub async fn create_patient(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PatientInput>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let repo = PatientRepository::new(state.db_pool.clone());
    let id = repo.create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody::new("Patient registered successfully").with_id(id)),
    ))
}

/// GET /api/patients
pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let repo = PatientRepository::new(state.db_pool.clone());
    Ok(Json(repo.list().await?))
}

/// GET /api/patients/:id
/// Patient fields plus every dependent record
pub async fn get_patient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PatientRecord>, ApiError> {
    let repo = PatientRepository::new(state.db_pool.clone());
    Ok(Json(repo.get(id).await?))
}

/// PUT /api/patients/:id
pub async fn update_patient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<PatientInput>,
) -> Result<Json<MessageBody>, ApiError> {
    let repo = PatientRepository::new(state.db_pool.clone());
    repo.update(id, input).await?;
    Ok(Json(MessageBody::new("Patient updated successfully")))
}

/// DELETE /api/patients/:id
pub async fn delete_patient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageBody>, ApiError> {
    let repo = PatientRepository::new(state.db_pool.clone());
    repo.delete(id).await?;
    Ok(Json(MessageBody::new("Patient deleted successfully")))
}
