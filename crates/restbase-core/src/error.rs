//! Error types for restbase.
//!
//! Every variant knows which HTTP status it should surface as, so the server
//! layer can turn any library failure into a response without matching on
//! message text.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the restbase library.
#[derive(Debug, Error)]
pub enum RestbaseError {
    // Request errors
    #[error("Could not convert {id} to ObjectId")]
    InvalidObjectId { id: String },

    #[error("id {id} not found in {collection}")]
    DocumentNotFound { collection: String, id: String },

    #[error("unknown resource: {name}")]
    UnknownResource { name: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    SelfTest { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for restbase operations.
pub type Result<T> = std::result::Result<T, RestbaseError>;

impl From<std::io::Error> for RestbaseError {
    fn from(err: std::io::Error) -> Self {
        RestbaseError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for RestbaseError {
    fn from(err: serde_json::Error) -> Self {
        RestbaseError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for RestbaseError {
    fn from(err: rusqlite::Error) -> Self {
        RestbaseError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl RestbaseError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RestbaseError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a lock-poisoning failure on the database connection.
    pub(crate) fn lock_poisoned(err: impl std::fmt::Display) -> Self {
        RestbaseError::Database {
            message: format!("Failed to lock database: {}", err),
            source: None,
        }
    }

    /// HTTP status code this error should be reported with.
    ///
    /// - 404: unknown document or resource
    /// - 422: the request was well-formed but its content was rejected
    /// - 500: everything else
    pub fn status_code(&self) -> u16 {
        match self {
            RestbaseError::InvalidObjectId { .. } | RestbaseError::Validation { .. } => 422,

            RestbaseError::DocumentNotFound { .. } | RestbaseError::UnknownResource { .. } => 404,

            _ => 500,
        }
    }

    /// Whether the error was caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RestbaseError::InvalidObjectId { id: "abc".into() };
        assert_eq!(err.to_string(), "Could not convert abc to ObjectId");

        let err = RestbaseError::DocumentNotFound {
            collection: "entities".into(),
            id: "64b7f0c2a1b2c3d4e5f60718".into(),
        };
        assert_eq!(
            err.to_string(),
            "id 64b7f0c2a1b2c3d4e5f60718 not found in entities"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RestbaseError::InvalidObjectId { id: "x".into() }.status_code(),
            422
        );
        assert_eq!(
            RestbaseError::UnknownResource { name: "x".into() }.status_code(),
            404
        );
        assert_eq!(
            RestbaseError::Config {
                message: "bad".into()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(RestbaseError::Validation {
            field: "body".into(),
            message: "not an object".into()
        }
        .is_client_error());
        assert!(!RestbaseError::Other("boom".into()).is_client_error());
    }
}
