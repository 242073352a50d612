//! # Error Types
//!
//! Shared error types for the foundational crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//! Crates further up the DAG define their own enums and wrap these.

use thiserror::Error;

/// Top-level error type for `polcron-core`.
#[derive(Error, Debug)]
pub enum PolcronError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An identifier failed validation.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// A timestamp could not be parsed or constructed.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),

    /// A schedule category name was not recognized.
    #[error("unknown schedule category: {0:?}")]
    UnknownCategory(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error constructing or parsing an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The identifier was empty or whitespace.
    #[error("{kind} must not be empty")]
    Empty {
        /// Which identifier kind was rejected.
        kind: &'static str,
    },

    /// A GUID string could not be parsed.
    #[error("invalid GUID {value:?}: {reason}")]
    InvalidGuid {
        /// The rejected input.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A content digest string could not be parsed.
    #[error("invalid content digest {value:?}: {reason}")]
    InvalidDigest {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
