pub mod auth;
pub mod health;

use crate::error::ApiError;
use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Success response body
#[derive(Debug, Serialize)]
pub struct AuthResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<T>,
}

impl<T> AuthResponse<T> {
    pub fn with_user(message: impl Into<String>, user: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            user: Some(user),
        }
    }

    pub fn user(user: T) -> Self {
        Self {
            success: true,
            message: None,
            user: Some(user),
        }
    }
}

impl AuthResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            user: None,
        }
    }
}

/// Parses a JSON body; an empty body reads as `{}` so absent fields are
/// reported as missing rather than as a malformed request.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let bytes: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed JSON body");
        ApiError::malformed_body(e.to_string())
    })
}
