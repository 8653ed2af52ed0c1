//! Error types for the file store.

use thiserror::Error;

/// Common error type for the file store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested name is malformed or would resolve outside the storage root.
    ///
    /// Raised before any filesystem access takes place.
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    /// The target of an operation does not exist.
    ///
    /// The payload names the subject, e.g. `File report.txt` or `Source file a.txt`.
    #[error("{0} not found")]
    NotFound(String),

    /// Copy or move was requested without both a source and a destination.
    #[error("Both source and destination parameters are required")]
    MissingParameter,

    /// The storage root could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(std::io::Error),

    /// I/O error outside the storage root (config and log files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for file store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
