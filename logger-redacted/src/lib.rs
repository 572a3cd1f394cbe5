//! Logging with automatic PII and credential redaction for MedGate
//!
//! Identity services handle emails, passwords and session tokens. None of
//! these may reach a log sink in clear text: emails are replaced with a
//! short correlation hash so operators can still follow one account across
//! events, while tokens and bearer headers are dropped outright.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::redact_email;
//!
//! let tag = redact_email("Alice@Example.com");
//! assert!(tag.starts_with("EMAIL["));
//! assert_eq!(tag, redact_email("alice@example.com"));
//! ```

pub mod config;
pub mod redactor;

pub use config::*;
pub use redactor::*;

use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Install the process-wide tracing subscriber
///
/// `RUST_LOG` wins over the configured directives when present.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directives()));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    }
}
