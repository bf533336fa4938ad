//! Error types
//!
//! `BackendError` covers everything the persistence adapter can report;
//! `ApiError` is the crate-level error used by configuration, start-up and
//! the composition root.

use crate::types::NodeId;
use thiserror::Error;

/// Failures reported by a file backend (remote REST store or local sled store)
#[derive(Debug, Error)]
pub enum BackendError {
    /// Missing, invalid or expired credential
    #[error("unauthorized")]
    Unauthorized,

    /// The identity does not exist in the caller's owner scope
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// A node already exists at this path
    #[error("path already exists: {0}")]
    PathExists(String),

    /// Local node lookup by path failed
    #[error("no node at path: {0}")]
    MissingPath(String),

    /// Remote-mode write against a node that was never persisted remotely
    #[error("node has no remote identity: {0}")]
    MissingIdentity(String),

    #[error("network error: {0}")]
    Network(String),

    /// Unexpected HTTP status from the remote store
    #[error("remote store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            return BackendError::Unauthorized;
        }
        if err.is_decode() {
            return BackendError::Serialization(err.to_string());
        }
        BackendError::Network(err.to_string())
    }
}

impl From<sled::Error> for BackendError {
    fn from(err: sled::Error) -> Self {
        BackendError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for ApiError {
    fn from(err: sled::Error) -> Self {
        ApiError::Backend(BackendError::from(err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Backend(BackendError::from(err))
    }
}
