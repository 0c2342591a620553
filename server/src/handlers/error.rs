use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::db::StoreError;
use crate::models::ErrorBody;

/// Error response with a JSON `{"error": {...}}` body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    /// Create validation error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::error("invalid", message),
        }
    }

    /// Create not found error
    pub fn not_found(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody::error_with_location("not-found", message, location),
        }
    }

    /// Create conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            body: ErrorBody::error("conflict", message),
        }
    }

    /// Create server error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::error("exception", message),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorBody::error("unavailable", message),
        }
    }

    /// Report a duplicate as a bad request instead of a conflict
    pub fn conflict_as_invalid(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody::error("duplicate", message),
            },
            other => other.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::not_found(
                format!("{entity} with id {id} not found"),
                format!("{entity}/{id}"),
            ),
            StoreError::Conflict(message) => Self::conflict(message),
            StoreError::InvalidInput(message) => Self::invalid(message),
            err @ (StoreError::Database(_) | StoreError::Migration { .. }) => {
                tracing::error!(error = %err, "Storage failure");
                Self::internal_error("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status_codes() {
        let cases = [
            (StoreError::not_found("Patient", "p1"), StatusCode::NOT_FOUND),
            (StoreError::Conflict("dup".into()), StatusCode::CONFLICT),
            (StoreError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (
                StoreError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = ApiError::from(StoreError::Migration {
            version: 1,
            reason: "syntax error near CREATE".into(),
        });
        assert_eq!(err.body.error.message, "Internal server error");
    }

    #[test]
    fn assignment_duplicates_are_bad_requests() {
        let err = ApiError::conflict_as_invalid(StoreError::Conflict("already active".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error.message, "already active");

        let err = ApiError::conflict_as_invalid(StoreError::not_found("Helper", "h1"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.error.location.as_deref(), Some("Helper/h1"));
    }
}
