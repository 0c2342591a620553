use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::ApiError;
use crate::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&*state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Health check failed");
            ApiError::unavailable("Database unreachable")
        })?;

    Ok(Json(json!({ "status": "ok" })))
}
