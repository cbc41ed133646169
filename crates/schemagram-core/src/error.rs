//! Error types for Schemagram

use thiserror::Error;

/// Core error type for catalog and diagram operations
#[derive(Error, Debug)]
pub enum SchemagramError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Object '{object}' belongs to project '{project}'")]
    CrossProject { object: String, project: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl SchemagramError {
    /// True for errors caused by an unreachable data source
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SchemagramError::Connection(_))
    }
}

/// Result type alias for Schemagram operations
pub type Result<T> = std::result::Result<T, SchemagramError>;
