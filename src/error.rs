use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("no organisation connected to the current credential")]
    NoTenant,

    #[error("vendor rejected request: {0}")]
    VendorRejected(String),

    #[error("bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::NotAuthenticated(msg) => (
                StatusCode::UNAUTHORIZED,
                "Not authenticated".to_string(),
                Some(msg),
            ),
            AppError::RefreshFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                "Token refresh failed".to_string(),
                Some(msg),
            ),
            AppError::NoTenant => (
                StatusCode::BAD_GATEWAY,
                "No organisation connected to the current credential".to_string(),
                None,
            ),
            AppError::VendorRejected(msg) => (
                StatusCode::BAD_GATEWAY,
                "Vendor rejected request".to_string(),
                Some(msg),
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string(), None),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
