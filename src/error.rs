//! # Error Types
//!
//! Custom error types for the GPS node using `thiserror`.

use thiserror::Error;

/// Main error type for the GPS node
#[derive(Debug, Error)]
pub enum GpsNodeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors (opening, configuring)
    #[error("Serial error: {0}")]
    Serial(String),

    /// Network transport errors (association, addressing)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for the GPS node
pub type Result<T> = std::result::Result<T, GpsNodeError>;
