//! Core error types for reclaim-core.
//!
//! This module defines the error hierarchy using thiserror. The taxonomy
//! mirrors the failure modes of the external collaborators: the identity
//! provider (auth), the document store (persistence/conflict), and local
//! configuration IO.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for reclaim-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Identity/authentication errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identity-provider errors.
///
/// The core never retries these; they propagate to the caller so the
/// surrounding screen can route the user back to sign-in.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A write was attempted without a signed-in identity
    #[error("Not signed in")]
    NotSignedIn,
}

/// Document-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A create hit an existing document for the same key.
    ///
    /// The bootstrap coordinator treats this as success: the desired
    /// postcondition ("a record exists") already holds.
    #[error("Document already exists")]
    Conflict,

    /// Backend or network failure on a read or write
    #[error("Backend error: {0}")]
    Backend(String),

    /// No document matched the given id
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Mutation attempted by a non-owner
    #[error("Not permitted: {0}")]
    Forbidden(String),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Whether this error is the distinguishable "already exists" kind.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict)
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors for user-supplied input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty or blank content where text is required
    #[error("Empty value for '{0}'")]
    Empty(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
