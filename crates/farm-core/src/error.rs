//! Error types for the farm record system

use thiserror::Error;

/// Main error type for all farm record operations
#[derive(Error, Debug)]
pub enum FarmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] farm_types::ValidationError),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend rejected {operation}: {status} - {message}")]
    Backend {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid table query: {0}")]
    InvalidQuery(String),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type for farm record operations
pub type Result<T> = std::result::Result<T, FarmError>;
