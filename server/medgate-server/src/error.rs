use auth_identity::IdentityError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::codes;
use logger_redacted::PiiRedactor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Message returned for every internal fault; the detail stays in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Server error, please try again later";

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Stable error code
    pub code: String,
    /// Correlation id, present only for internal faults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Malformed request body: {message}")]
    MalformedBody { message: String },
}

impl ApiError {
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            ApiError::Identity(error) => match error {
                IdentityError::MissingFields(_)
                | IdentityError::Validation(_)
                | IdentityError::DuplicateEmail => StatusCode::BAD_REQUEST,
                IdentityError::InvalidCredentials
                | IdentityError::TokenExpired
                | IdentityError::TokenInvalid
                | IdentityError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                IdentityError::NotFound => StatusCode::NOT_FOUND,
                IdentityError::Storage(_)
                | IdentityError::Hashing(_)
                | IdentityError::RollbackFailed { .. }
                | IdentityError::Configuration(_)
                | IdentityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MalformedBody { .. } => codes::validation::MALFORMED_BODY,
            ApiError::Identity(error) => error.code(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, ApiError::Identity(error) if error.is_internal())
    }

    /// Message safe to show the client.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::MalformedBody { .. } => "Invalid request body".to_string(),
            ApiError::Identity(error) if error.is_internal() => INTERNAL_ERROR_MESSAGE.to_string(),
            ApiError::Identity(error) => error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let error_id = if self.is_internal() {
            let error_id = Uuid::new_v4().to_string();
            // Storage errors can quote row values such as emails.
            let detail = PiiRedactor::default().redact(&self.to_string());
            error!(
                error_id = %error_id,
                code = self.code(),
                status_code = status_code.as_u16(),
                error = %detail,
                "Internal error while handling request"
            );
            Some(error_id)
        } else {
            info!(
                code = self.code(),
                status_code = status_code.as_u16(),
                "Request rejected"
            );
            None
        };

        let body = ApiErrorResponse {
            success: false,
            message: self.client_message(),
            code: self.code().to_string(),
            error_id,
        };

        (status_code, Json(body)).into_response()
    }
}
