//! Common error handling utilities for MedGate
//!
//! Stable error codes shared by the identity core and the HTTP surface, plus
//! the error type used while bootstrapping the server process.
//!
//! Codes are part of the client-facing contract: a response body carries the
//! code next to the human-readable message so front ends can branch on it
//! without string matching.
//!
//! # Example
//!
//! ```rust
//! use error_common::codes;
//!
//! assert_eq!(codes::authentication::INVALID_CREDENTIALS, "AUTH_2001");
//! ```

pub mod codes;
pub mod types;

pub use codes::*;
pub use types::*;
