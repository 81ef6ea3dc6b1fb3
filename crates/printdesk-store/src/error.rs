use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error (reading, writing or renaming a document).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk document could not be parsed or serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A lookup expected exactly one order but found none.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A required field was missing or malformed.
    #[error("Invalid order: {0}")]
    Invalid(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
