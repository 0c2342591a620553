use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiPath};
use crate::db::PatientInNeedRepository;
use crate::models::{MessageBody, PatientInNeed, PatientInNeedFields};
use crate::AppState;

/// POST /api/patients-in-need
pub async fn create_patient_in_need(
    State(state): State<AppState>,
    ApiJson(fields): ApiJson<PatientInNeedFields>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let repo = PatientInNeedRepository::new(state.db_pool.clone());
    let id = repo.create(fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody::new("Patient in need registered successfully").with_id(id)),
    ))
}

/// GET /api/patients-in-need
/// Newest registrations first
pub async fn list_patients_in_need(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientInNeed>>, ApiError> {
    let repo = PatientInNeedRepository::new(state.db_pool.clone());
    Ok(Json(repo.list().await?))
}

pub async fn get_patient_in_need(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PatientInNeed>, ApiError> {
    let repo = PatientInNeedRepository::new(state.db_pool.clone());
    Ok(Json(repo.get(id).await?))
}

pub async fn update_patient_in_need(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(fields): ApiJson<PatientInNeedFields>,
) -> Result<Json<PatientInNeed>, ApiError> {
    let repo = PatientInNeedRepository::new(state.db_pool.clone());
    Ok(Json(repo.update(id, fields).await?))
}

pub async fn delete_patient_in_need(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = PatientInNeedRepository::new(state.db_pool.clone());
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
