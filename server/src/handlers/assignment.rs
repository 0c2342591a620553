use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiPath};
use crate::db::AssignmentRegistry;
use crate::models::{Assignment, AssignmentRequest, CreatedAssignment, MessageBody};
use crate::AppState;

/// GET /api/assignments
/// Active assignments with patient and helper names
pub async fn list_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
    let registry = AssignmentRegistry::new(state.db_pool.clone());
    Ok(Json(registry.list().await?))
}

/// POST /api/assignments
/// A second active helper of the same kind is rejected with 400
pub async fn create_assignment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AssignmentRequest>,
) -> Result<(StatusCode, Json<CreatedAssignment>), ApiError> {
    let registry = AssignmentRegistry::new(state.db_pool.clone());
    let created = registry
        .create_from_request(request)
        .await
        .map_err(ApiError::conflict_as_invalid)?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/assignments/:id
/// Succeeds whether or not the assignment was still active
pub async fn delete_assignment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageBody>, ApiError> {
    let registry = AssignmentRegistry::new(state.db_pool.clone());
    registry.remove(id).await?;
    Ok(Json(MessageBody::new("Assignment removed successfully")))
}
