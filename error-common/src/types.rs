use thiserror::Error;

/// Errors raised while bootstrapping or running the server process
#[derive(Error, Debug)]
pub enum MedGateError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Storage bootstrap errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MedGate bootstrap operations
pub type Result<T> = std::result::Result<T, MedGateError>;

/// Log a bootstrap error with its context
pub fn log_error(context: &str, error: &MedGateError) {
    tracing::error!(
        context = context,
        error = %error,
        "MedGate error occurred"
    );
}
