use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use frontdesk_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent `{error, code}` JSON
/// bodies; the UI maps `code` to its retry-or-reset affordances.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `frontdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::InvalidState(msg) => {
                    (StatusCode::CONFLICT, "INVALID_STATE", msg.clone())
                }
                CoreError::AlreadyLocked => (
                    StatusCode::CONFLICT,
                    "ALREADY_LOCKED",
                    "Selection already locked by the other side".to_string(),
                ),
                CoreError::NoAvailableResource(msg) => {
                    (StatusCode::CONFLICT, "NO_AVAILABLE_RESOURCE", msg.clone())
                }
                CoreError::AssignmentFailed(msg) => {
                    (StatusCode::CONFLICT, "ASSIGNMENT_FAILED", msg.clone())
                }
                CoreError::Banned(msg) => (StatusCode::FORBIDDEN, "BANNED", msg.clone()),
                CoreError::DeviceDisabled => (
                    StatusCode::FORBIDDEN,
                    "DEVICE_DISABLED",
                    "Device is disabled or unknown".to_string(),
                ),
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`)
///   map to 409 — this is how lost races against the partial unique
///   indexes (live lane session, open reservation) surface when a caller
///   skipped the row-lock path.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_state_maps_to_409() {
        let (status, body) =
            body_of(AppError::Core(CoreError::InvalidState("nope".into()))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_STATE");
        assert_eq!(body["error"], "nope");
    }

    #[tokio::test]
    async fn already_locked_maps_to_409() {
        let (status, body) = body_of(AppError::Core(CoreError::AlreadyLocked)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_LOCKED");
    }

    #[tokio::test]
    async fn no_available_resource_surfaces_message() {
        let (status, body) = body_of(AppError::Core(CoreError::NoAvailableResource(
            "No available rooms".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "NO_AVAILABLE_RESOURCE");
        assert_eq!(body["error"], "No available rooms");
    }

    #[tokio::test]
    async fn banned_and_device_disabled_map_to_403() {
        let (status, body) = body_of(AppError::Core(CoreError::Banned("house ban".into()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "BANNED");

        let (status, body) = body_of(AppError::Core(CoreError::DeviceDisabled)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "DEVICE_DISABLED");
    }

    #[tokio::test]
    async fn internal_error_is_sanitized() {
        let (status, body) =
            body_of(AppError::InternalError("secret stack details".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"], "An internal error occurred");
    }
}
