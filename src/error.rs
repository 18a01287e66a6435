use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::SessionError;
use crate::orchestration::ManagerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Session is not initialized")]
    NotInitialized,
    #[error("Active entitlement required")]
    EntitlementDenied,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Session(SessionError::InvalidInput(msg)) => AppError::BadRequest(msg),
            ManagerError::Session(SessionError::NotInitialized) => AppError::NotInitialized,
            ManagerError::EntitlementDenied => AppError::EntitlementDenied,
            ManagerError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotInitialized => (
                StatusCode::CONFLICT,
                "Session is not initialized".to_string(),
            ),
            AppError::EntitlementDenied => (
                StatusCode::PAYMENT_REQUIRED,
                "Active entitlement required".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
